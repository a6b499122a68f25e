//! Cross-reference resolution after all usages exist.
//!
//! Each record's accepted, parent and original-name references are turned
//! into graph relations. Lookup ladder: exact identifier, identifier lists
//! split on a delimiter, then scientific name; names that resolve to
//! nothing are materialized as doubtful usages so the reference is never
//! silently dropped.

use tracing::{debug, warn};

use clade_graph::{Labels, NodeId};

use crate::error::Result;
use crate::interpret::NameParser;
use crate::store::GraphStore;
use crate::terms::Term;
use crate::types::{Issue, MappingFlags, NameUsage, Origin, VerbatimRecord};

/// Delimiters probed for multi-valued identifier columns, in order.
const ID_SPLITTERS: [char; 4] = ['|', ';', ',', ' '];

/// Resolves one node's verbatim references into relations.
pub struct RelationLinker<'a> {
    parser: &'a dyn NameParser,
    flags: MappingFlags,
    delimiter: Option<char>,
}

impl<'a> RelationLinker<'a> {
    pub fn new(
        parser: &'a dyn NameParser,
        flags: MappingFlags,
        id_delimiter: Option<&str>,
    ) -> Self {
        Self {
            parser,
            flags,
            delimiter: id_delimiter.and_then(|d| d.chars().next()),
        }
    }

    /// Process one node: create its relations and persist any new issues.
    pub fn process(&self, store: &mut GraphStore, node: NodeId) -> Result<()> {
        let mut usage = store.get(node)?;
        let Some(key) = usage.verbatim_key else {
            return Ok(());
        };
        let Some(record) = store.get_verbatim(key)? else {
            return Ok(());
        };
        self.link_accepted(store, node, &mut usage, &record)?;
        self.link_parent(store, node, &mut usage, &record)?;
        self.link_basionym(store, node, &mut usage, &record)?;
        store.put(node, &usage)?;
        Ok(())
    }

    fn link_accepted(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        usage: &mut NameUsage,
        record: &VerbatimRecord,
    ) -> Result<()> {
        let mut accepted: Vec<NodeId> = Vec::new();
        if self.flags.accepted_name_mapped {
            accepted = self.lookup(
                store,
                node,
                usage,
                record,
                Reference {
                    id_term: Term::AcceptedNameUsageId,
                    name_term: Term::AcceptedNameUsage,
                    invalid_issue: Issue::AcceptedIdInvalid,
                    origin: Origin::VerbatimAccepted,
                    allow_multiple: true,
                },
            )?;
            for target in &accepted {
                store.create_synonym_rel(node, *target)?;
            }
        }
        // A synonym without a resolvable accepted taxon gets a placeholder
        // so it stays attached to the tree.
        if accepted.is_empty()
            && (usage.is_synonym() || usage.diagnostics.has(Issue::AcceptedIdInvalid))
        {
            usage.diagnostics.flag(Issue::AcceptedNameMissing);
            let placeholder = store.create_placeholder()?;
            if let Some(classification) = usage.classification.take() {
                store.update(placeholder, move |p| {
                    p.classification = Some(classification);
                })?;
            }
            store.create_synonym_rel(node, placeholder)?;
            debug!(%node, %placeholder, "synonym attached to a placeholder");
        }
        Ok(())
    }

    fn link_parent(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        usage: &mut NameUsage,
        record: &VerbatimRecord,
    ) -> Result<()> {
        if !self.flags.parent_name_mapped {
            return Ok(());
        }
        let parent = self.lookup(
            store,
            node,
            usage,
            record,
            Reference {
                id_term: Term::ParentNameUsageId,
                name_term: Term::ParentNameUsage,
                invalid_issue: Issue::ParentIdInvalid,
                origin: Origin::VerbatimParent,
                allow_multiple: false,
            },
        )?;
        if let Some(parent) = parent.first() {
            store.assign_parent(*parent, node)?;
        }
        Ok(())
    }

    fn link_basionym(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        usage: &mut NameUsage,
        record: &VerbatimRecord,
    ) -> Result<()> {
        if !self.flags.original_name_mapped {
            return Ok(());
        }
        let basionym = self.lookup(
            store,
            node,
            usage,
            record,
            Reference {
                id_term: Term::OriginalNameUsageId,
                name_term: Term::OriginalNameUsage,
                invalid_issue: Issue::BasionymIdInvalid,
                origin: Origin::VerbatimBasionym,
                allow_multiple: false,
            },
        )?;
        if let Some(basionym) = basionym.first() {
            if store.create_basionym_rel(*basionym, node)? {
                // the final put writes this copy back over the stamped payload
                usage.name.homotypic_key = Some(*basionym);
            }
        }
        Ok(())
    }

    fn lookup(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        usage: &mut NameUsage,
        record: &VerbatimRecord,
        reference: Reference,
    ) -> Result<Vec<NodeId>> {
        let mut found = self.lookup_by_id(store, usage, record, &reference);
        if found.is_empty() {
            if let Some(hit) = self.lookup_by_name(store, node, usage, record, &reference)? {
                found.push(hit);
            }
        }
        Ok(found)
    }

    /// Exact identifier first; when that misses and lists are allowed, the
    /// value is split on the first delimiter that yields several parts.
    fn lookup_by_id(
        &self,
        store: &GraphStore,
        usage: &mut NameUsage,
        record: &VerbatimRecord,
        reference: &Reference,
    ) -> Vec<NodeId> {
        let Some(raw) = record.value(reference.id_term) else {
            return Vec::new();
        };
        // Self-references are a common way of writing "none".
        if usage.taxon_id.as_deref() == Some(raw) {
            return Vec::new();
        }
        if let Some(hit) = store.by_id(raw) {
            return vec![hit];
        }
        if reference.allow_multiple {
            let splitters: Vec<char> = match self.delimiter {
                Some(d) => vec![d],
                None => ID_SPLITTERS.to_vec(),
            };
            for splitter in splitters {
                let parts: Vec<&str> = raw
                    .split(splitter)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect();
                if parts.len() > 1 {
                    let hits: Vec<NodeId> = parts
                        .iter()
                        .filter(|p| usage.taxon_id.as_deref() != Some(**p))
                        .filter_map(|p| store.by_id(p))
                        .collect();
                    if !hits.is_empty() {
                        return hits;
                    }
                    break;
                }
            }
        }
        warn!(term = %reference.id_term, value = raw, "referenced identifier not found");
        usage.diagnostics.flag(reference.invalid_issue);
        Vec::new()
    }

    /// Name lookup with author-aware filtering. Ambiguous matches drop
    /// synonyms first; a still-ambiguous result is flagged and the first
    /// match taken. A complete miss materializes a doubtful usage.
    fn lookup_by_name(
        &self,
        store: &mut GraphStore,
        node: NodeId,
        usage: &mut NameUsage,
        record: &VerbatimRecord,
        reference: &Reference,
    ) -> Result<Option<NodeId>> {
        let Some(raw) = record.value(reference.name_term) else {
            return Ok(None);
        };
        let mut name = self.parser.parse(raw, None);
        if !name.rebuild_scientific_name() {
            name.scientific_name = Some(raw.to_string());
        }
        let scientific = name
            .scientific_name
            .clone()
            .unwrap_or_else(|| raw.to_string());
        // A record naming itself means "none".
        if usage
            .name
            .scientific_name
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(&scientific))
        {
            return Ok(None);
        }

        let mut matches = store.usages_by_name(&scientific);
        if matches.is_empty() {
            if let Some(canonical) = name.canonical_name() {
                matches = store.usages_by_name(&canonical);
            }
        }
        matches.retain(|m| *m != node);
        if !name.authorship.is_empty() {
            let author = name.authorship.to_string();
            matches.retain(|m| match store.graph().card(*m) {
                Ok(card) => card
                    .authorship
                    .as_deref()
                    .is_none_or(|a| a.eq_ignore_ascii_case(&author)),
                Err(_) => false,
            });
        }
        if matches.len() > 1 {
            matches.retain(|m| !store.graph().has_label(*m, Labels::SYNONYM));
        }
        if matches.is_empty() {
            debug!(name = raw, origin = %reference.origin, "materializing referenced name");
            let created = store.create_doubtful_from_source(node, name, reference.origin)?;
            return Ok(Some(created));
        }
        if matches.len() > 1 {
            usage.diagnostics.flag(Issue::NameNotUnique);
        }
        Ok(Some(matches[0]))
    }
}

/// How one cross-reference kind is looked up.
struct Reference {
    id_term: Term,
    name_term: Term,
    invalid_issue: Issue,
    origin: Origin,
    allow_multiple: bool,
}
