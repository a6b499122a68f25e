//! The normalization store: in-memory taxon graph plus SQLite payloads.
//!
//! [`GraphStore`] is the single handle every stage works against. The graph
//! side holds topology and the lightweight name cards used for lookups; the
//! SQLite side holds the full interpreted usages and verbatim records. Node
//! ids are shared between both sides.

pub(crate) mod schema;
mod sqlite;

pub use sqlite::PayloadStore;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use clade_graph::{Edge, Labels, NodeCard, NodeId, Rank, RelType, TaxonGraph};

use crate::error::{NormalizationError, Result};
use crate::name::Name;
use crate::types::{
    InsertionMetadata, NameType, NameUsage, Origin, TaxonomicStatus, VerbatimKey, VerbatimRecord,
};

/// Scientific name used for synthesized accepted taxa of orphaned synonyms.
pub const PLACEHOLDER_NAME: &str = "Incertae sedis";

/// Graph plus payload store behind one interface.
///
/// All mutation goes through `&mut self`; the engine is single-threaded and
/// the only cross-thread surface is the interrupt flag.
#[derive(Debug)]
pub struct GraphStore {
    graph: TaxonGraph,
    payloads: PayloadStore,
    /// Source identifier to node. First occurrence wins; repeats are
    /// collected and reported by [`Self::end_bulk`].
    ids: HashMap<String, NodeId>,
    /// Lowercased canonical and scientific names to nodes.
    names: HashMap<String, Vec<NodeId>>,
    duplicate_ids: Vec<String>,
    interrupt: Arc<AtomicBool>,
}

impl GraphStore {
    /// Opens a store backed by a database file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::with_payloads(PayloadStore::open(path)?))
    }

    /// Opens a fully in-memory store.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_payloads(PayloadStore::in_memory()?))
    }

    fn with_payloads(payloads: PayloadStore) -> Self {
        Self {
            graph: TaxonGraph::new(),
            payloads,
            ids: HashMap::new(),
            names: HashMap::new(),
            duplicate_ids: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The topology side. Passes read degrees, edges and cards through this.
    pub fn graph(&self) -> &TaxonGraph {
        &self.graph
    }

    /// Mutable topology access for edge surgery inside repair passes.
    pub fn graph_mut(&mut self) -> &mut TaxonGraph {
        &mut self.graph
    }

    /// The payload side, read-only. Mutation goes through the facade.
    pub fn payloads(&self) -> &PayloadStore {
        &self.payloads
    }

    /// Shared flag that aborts batch processing when set.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Whether an interrupt has been requested.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    // ── Usages ───────────────────────────────────────────────────

    /// Creates a node for the usage, stores its payload and indexes it.
    ///
    /// The node label follows the taxonomic status: synonyms get SYNONYM,
    /// everything else TAXON.
    pub fn create_usage(&mut self, usage: &NameUsage) -> Result<NodeId> {
        let labels = if usage.is_synonym() {
            Labels::SYNONYM
        } else {
            Labels::TAXON
        };
        let rank = usage.name.rank.unwrap_or(Rank::Unranked);
        let mut card = NodeCard::new(
            labels,
            rank,
            usage.name.scientific_name.clone().unwrap_or_default(),
        );
        card.canonical_name = usage.name.canonical_name();
        if !usage.name.authorship.is_empty() {
            card.authorship = Some(usage.name.authorship.to_string());
        }
        let id = self.graph.add_node(card);
        self.payloads.put_usage(id, usage)?;
        self.index_usage(id, usage);
        Ok(id)
    }

    fn index_usage(&mut self, id: NodeId, usage: &NameUsage) {
        if let Some(taxon_id) = usage.taxon_id.as_deref() {
            match self.ids.entry(taxon_id.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
                Entry::Occupied(_) => self.duplicate_ids.push(taxon_id.to_string()),
            }
        }
        let mut keys: Vec<String> = Vec::new();
        if let Some(canonical) = usage.name.canonical_name() {
            keys.push(canonical.to_lowercase());
        }
        if let Some(scientific) = usage.name.scientific_name.as_deref() {
            let key = scientific.trim().to_lowercase();
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        for key in keys {
            self.names.entry(key).or_default().push(id);
        }
    }

    /// Loads the stored usage; missing payloads are an error.
    pub fn get(&self, id: NodeId) -> Result<NameUsage> {
        Ok(self.payloads.require_usage(id)?)
    }

    /// Loads the stored usage if the node has one.
    pub fn maybe_get(&self, id: NodeId) -> Result<Option<NameUsage>> {
        Ok(self.payloads.get_usage(id)?)
    }

    /// Overwrites the stored usage.
    pub fn put(&mut self, id: NodeId, usage: &NameUsage) -> Result<()> {
        Ok(self.payloads.put_usage(id, usage)?)
    }

    /// Loads, mutates and stores a usage in one step.
    pub fn update<F>(&mut self, id: NodeId, f: F) -> Result<()>
    where
        F: FnOnce(&mut NameUsage),
    {
        let mut usage = self.payloads.require_usage(id)?;
        f(&mut usage);
        Ok(self.payloads.put_usage(id, &usage)?)
    }

    /// Stores a verbatim record under its key.
    pub fn put_verbatim(&mut self, key: VerbatimKey, record: &VerbatimRecord) -> Result<()> {
        Ok(self.payloads.put_verbatim(key, record)?)
    }

    /// Loads a verbatim record.
    pub fn get_verbatim(&self, key: VerbatimKey) -> Result<Option<VerbatimRecord>> {
        Ok(self.payloads.get_verbatim(key)?)
    }

    /// Persists the run metadata.
    pub fn save_metadata(&self, meta: &InsertionMetadata) -> Result<()> {
        Ok(self.payloads.save_metadata(meta)?)
    }

    // ── Lookups ──────────────────────────────────────────────────

    /// Node carrying the given source identifier, if exactly known.
    pub fn by_id(&self, taxon_id: &str) -> Option<NodeId> {
        self.ids.get(taxon_id).copied()
    }

    /// Nodes whose canonical or full scientific name matches, case
    /// insensitively.
    pub fn usages_by_name(&self, name: &str) -> Vec<NodeId> {
        self.names
            .get(&name.trim().to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Name matches narrowed to a rank. With `match_unranked` set, nodes of
    /// unknown rank also qualify.
    pub fn usages_by_name_and_rank(
        &self,
        name: &str,
        rank: Rank,
        match_unranked: bool,
    ) -> Vec<NodeId> {
        self.usages_by_name(name)
            .into_iter()
            .filter(|id| match self.graph.card(*id) {
                Ok(card) => card.rank == rank || (match_unranked && card.rank == Rank::Unranked),
                Err(_) => false,
            })
            .collect()
    }

    // ── Relations ────────────────────────────────────────────────

    /// Makes `parent` the parent of `child` unless the child already has
    /// one. Never replaces; a conflicting second parent is logged and
    /// dropped.
    pub fn assign_parent(&mut self, parent: NodeId, child: NodeId) -> Result<bool> {
        if parent == child {
            return Ok(false);
        }
        if let Some(existing) = self.graph.parent_of(child) {
            if existing != parent {
                warn!(%child, %existing, "child already has a parent, keeping the existing one");
            }
            return Ok(false);
        }
        Ok(self.graph.create_rel(parent, child, RelType::ParentOf)?)
    }

    /// Connects a synonym to its accepted taxon.
    ///
    /// Relabels the source node TAXON to SYNONYM. A parent recorded on the
    /// synonym belongs on the accepted side, so a single incoming parent
    /// edge is moved over when the accepted taxon does not have one yet.
    pub fn create_synonym_rel(&mut self, synonym: NodeId, accepted: NodeId) -> Result<bool> {
        if synonym == accepted {
            return Ok(false);
        }
        let created = self.graph.create_rel(synonym, accepted, RelType::SynonymOf)?;
        self.graph.unset_label(synonym, Labels::TAXON)?;
        self.graph.set_label(synonym, Labels::SYNONYM)?;
        if let Some(parent) = self.graph.parent_of(synonym) {
            if self.graph.parent_of(accepted).is_none() && parent != accepted {
                self.graph.delete_rel(&Edge {
                    source: parent,
                    target: synonym,
                    rel: RelType::ParentOf,
                });
                self.graph.create_rel(parent, accepted, RelType::ParentOf)?;
                debug!(%synonym, %accepted, "moved parent from synonym to accepted taxon");
            }
        }
        Ok(created)
    }

    /// Connects an original name to a later combination and stamps both
    /// usages with the shared homotypic group key (the basionym's node id).
    pub fn create_basionym_rel(&mut self, basionym: NodeId, combination: NodeId) -> Result<bool> {
        if basionym == combination {
            return Ok(false);
        }
        let created = self
            .graph
            .create_rel(basionym, combination, RelType::BasionymOf)?;
        if created {
            self.graph.set_label(basionym, Labels::BASIONYM)?;
            for node in [basionym, combination] {
                let mut usage = self.payloads.require_usage(node)?;
                if usage.name.homotypic_key != Some(basionym) {
                    usage.name.homotypic_key = Some(basionym);
                    self.payloads.put_usage(node, &usage)?;
                }
            }
        }
        Ok(created)
    }

    // ── Synthesized nodes ────────────────────────────────────────

    /// Creates a fresh "Incertae sedis" placeholder to stand in for a
    /// missing accepted taxon.
    pub fn create_placeholder(&mut self) -> Result<NodeId> {
        let mut name = Name::default();
        name.scientific_name = Some(PLACEHOLDER_NAME.to_string());
        name.rank = Some(Rank::Unranked);
        name.name_type = Some(NameType::Placeholder);
        name.origin = Some(Origin::MissingAccepted);
        let mut usage = NameUsage::new(name);
        usage.status = Some(TaxonomicStatus::Doubtful);
        usage.origin = Some(Origin::MissingAccepted);
        self.create_usage(&usage)
    }

    /// Creates an accepted higher taxon synthesized from a denormalized
    /// classification column.
    pub fn create_higher_taxon(&mut self, name: &str, rank: Rank) -> Result<NodeId> {
        let mut n = Name::default();
        n.uninomial = Some(name.to_string());
        n.scientific_name = Some(name.to_string());
        n.rank = Some(rank);
        n.name_type = Some(NameType::Scientific);
        n.origin = Some(Origin::DenormedClassification);
        let mut usage = NameUsage::new(n);
        usage.status = Some(TaxonomicStatus::Accepted);
        usage.origin = Some(Origin::DenormedClassification);
        self.create_usage(&usage)
    }

    /// Creates a doubtful usage for a name that was only referenced, never
    /// defined, by the source. The referencing usage's classification is
    /// carried over so the new node can still be placed.
    pub fn create_doubtful_from_source(
        &mut self,
        source: NodeId,
        mut name: Name,
        origin: Origin,
    ) -> Result<NodeId> {
        name.origin = Some(origin);
        let mut usage = NameUsage::new(name);
        usage.status = Some(TaxonomicStatus::Doubtful);
        usage.origin = Some(origin);
        usage.classification = self
            .payloads
            .get_usage(source)?
            .and_then(|u| u.classification);
        self.create_usage(&usage)
    }

    // ── Sweeps ───────────────────────────────────────────────────

    /// Runs `f` over every node carrying `label`, committing payload writes
    /// every `batch_size` nodes and honoring the interrupt flag at batch
    /// boundaries. Returns the number of nodes processed.
    ///
    /// The node set is snapshotted up front; nodes created by `f` are not
    /// visited in the same sweep.
    pub fn process<F>(&mut self, label: Labels, batch_size: usize, mut f: F) -> Result<u64>
    where
        F: FnMut(&mut Self, NodeId) -> Result<()>,
    {
        let nodes: Vec<NodeId> = self.graph.nodes(label).collect();
        let batch = batch_size.max(1) as u64;
        let mut processed: u64 = 0;
        self.payloads.begin()?;
        for id in nodes {
            if !self.graph.contains(id) {
                continue;
            }
            if let Err(err) = f(self, id) {
                let _ = self.payloads.rollback();
                return Err(err);
            }
            processed += 1;
            if processed % batch == 0 {
                self.payloads.commit()?;
                if self.is_interrupted() {
                    return Err(NormalizationError::Interrupted.into());
                }
                self.payloads.begin()?;
            }
        }
        self.payloads.commit()?;
        Ok(processed)
    }

    /// Recomputes the derived ROOT and BASIONYM labels across the graph.
    pub fn update_labels(&mut self) -> Result<()> {
        let nodes: Vec<NodeId> = self.graph.nodes(Labels::ALL).collect();
        for id in nodes {
            let is_root = self.graph.has_label(id, Labels::TAXON)
                && self.graph.in_degree(id, RelType::ParentOf) == 0;
            if is_root {
                self.graph.set_label(id, Labels::ROOT)?;
            } else {
                self.graph.unset_label(id, Labels::ROOT)?;
            }
            if self.graph.out_degree(id, RelType::BasionymOf) > 0 {
                self.graph.set_label(id, Labels::BASIONYM)?;
            } else {
                self.graph.unset_label(id, Labels::BASIONYM)?;
            }
        }
        Ok(())
    }

    /// Writes the resolved parent, accepted and basionym node references
    /// into every stored payload, so the database alone describes the final
    /// graph.
    pub fn sync_relations(&mut self, batch_size: usize) -> Result<u64> {
        self.process(Labels::ALL, batch_size, |store, id| {
            let mut usage = store.payloads.require_usage(id)?;
            let parent = store.graph.parent_of(id);
            let accepted = store.graph.targets(id, RelType::SynonymOf);
            let basionym = store.graph.sources(id, RelType::BasionymOf).first().copied();
            if usage.parent_id != parent
                || usage.accepted_ids != accepted
                || usage.basionym_id != basionym
            {
                usage.parent_id = parent;
                usage.accepted_ids = accepted;
                usage.basionym_id = basionym;
                store.payloads.put_usage(id, &usage)?;
            }
            Ok(())
        })
    }

    // ── Transactions and lifecycle ───────────────────────────────

    /// Enters bulk-load mode on the payload side.
    pub fn start_bulk(&mut self) -> Result<()> {
        Ok(self.payloads.start_bulk()?)
    }

    /// Leaves bulk-load mode and reports the duplicate source identifiers
    /// collected while indexing, sorted and deduplicated.
    pub fn end_bulk(&mut self) -> Result<Vec<String>> {
        self.payloads.end_bulk()?;
        let mut dups = std::mem::take(&mut self.duplicate_ids);
        dups.sort();
        dups.dedup();
        if !dups.is_empty() {
            warn!(count = dups.len(), "source reuses taxon identifiers");
        }
        Ok(dups)
    }

    /// Opens an explicit payload transaction.
    pub fn begin(&mut self) -> Result<()> {
        Ok(self.payloads.begin()?)
    }

    /// Commits the explicit payload transaction.
    pub fn commit(&mut self) -> Result<()> {
        Ok(self.payloads.commit()?)
    }

    /// Closes the store, keeping the database on disk.
    pub fn close(self) -> Result<()> {
        Ok(self.payloads.close()?)
    }

    /// Closes the store and deletes the database.
    pub fn close_and_delete(self) -> Result<()> {
        Ok(self.payloads.close_and_delete()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Issue;

    fn species(taxon_id: &str, scientific: &str, status: TaxonomicStatus) -> NameUsage {
        let mut name = Name::default();
        name.scientific_name = Some(scientific.to_string());
        name.rank = Some(Rank::Species);
        name.name_type = Some(NameType::Scientific);
        let mut usage = NameUsage::new(name);
        usage.taxon_id = Some(taxon_id.to_string());
        usage.status = Some(status);
        usage
    }

    fn store_with(usages: &[NameUsage]) -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::in_memory().unwrap();
        let ids = usages
            .iter()
            .map(|u| store.create_usage(u).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn create_usage_labels_follow_status() {
        let (store, ids) = store_with(&[
            species("a", "Abies alba Mill.", TaxonomicStatus::Accepted),
            species("s", "Pinus abies L.", TaxonomicStatus::Synonym),
        ]);
        assert!(store.graph().has_label(ids[0], Labels::TAXON));
        assert!(!store.graph().has_label(ids[0], Labels::SYNONYM));
        assert!(store.graph().has_label(ids[1], Labels::SYNONYM));
        assert!(!store.graph().has_label(ids[1], Labels::TAXON));
    }

    #[test]
    fn lookup_by_id_and_by_name() {
        let mut u = species("t1", "Abies alba Mill.", TaxonomicStatus::Accepted);
        u.name.genus = Some("Abies".into());
        u.name.specific_epithet = Some("alba".into());
        let (store, ids) = store_with(&[u]);

        assert_eq!(store.by_id("t1"), Some(ids[0]));
        assert_eq!(store.by_id("nope"), None);
        // canonical key, scientific key, case folded
        assert_eq!(store.usages_by_name("Abies alba"), vec![ids[0]]);
        assert_eq!(store.usages_by_name("ABIES ALBA MILL."), vec![ids[0]]);
    }

    #[test]
    fn rank_narrowed_lookup_optionally_matches_unranked() {
        let mut genus = species("g", "Abies", TaxonomicStatus::Accepted);
        genus.name.rank = Some(Rank::Genus);
        let mut loose = species("u", "Abies", TaxonomicStatus::Accepted);
        loose.name.rank = None;
        let (store, ids) = store_with(&[genus, loose]);

        assert_eq!(
            store.usages_by_name_and_rank("abies", Rank::Genus, false),
            vec![ids[0]]
        );
        assert_eq!(
            store.usages_by_name_and_rank("abies", Rank::Genus, true),
            vec![ids[0], ids[1]]
        );
    }

    #[test]
    fn duplicate_ids_surface_at_end_bulk() {
        let mut store = GraphStore::in_memory().unwrap();
        store.start_bulk().unwrap();
        for name in ["A b", "C d", "E f"] {
            store
                .create_usage(&species("dup", name, TaxonomicStatus::Accepted))
                .unwrap();
        }
        store
            .create_usage(&species("ok", "G h", TaxonomicStatus::Accepted))
            .unwrap();
        let dups = store.end_bulk().unwrap();
        assert_eq!(dups, vec!["dup".to_string()]);
        // first occurrence stays authoritative
        let winner = store.by_id("dup").unwrap();
        assert_eq!(
            store.get(winner).unwrap().name.scientific_name.as_deref(),
            Some("A b")
        );
    }

    #[test]
    fn assign_parent_never_replaces() {
        let (mut store, ids) = store_with(&[
            species("p1", "Abies", TaxonomicStatus::Accepted),
            species("p2", "Picea", TaxonomicStatus::Accepted),
            species("c", "Abies alba", TaxonomicStatus::Accepted),
        ]);
        assert!(store.assign_parent(ids[0], ids[2]).unwrap());
        assert!(!store.assign_parent(ids[1], ids[2]).unwrap());
        assert_eq!(store.graph().parent_of(ids[2]), Some(ids[0]));
        assert!(!store.assign_parent(ids[2], ids[2]).unwrap());
    }

    #[test]
    fn synonym_rel_relabels_and_moves_the_parent() {
        let (mut store, ids) = store_with(&[
            species("gen", "Abies", TaxonomicStatus::Accepted),
            species("syn", "Pinus abies", TaxonomicStatus::Accepted),
            species("acc", "Abies alba", TaxonomicStatus::Accepted),
        ]);
        let (genus, syn, acc) = (ids[0], ids[1], ids[2]);
        store.assign_parent(genus, syn).unwrap();

        assert!(store.create_synonym_rel(syn, acc).unwrap());
        assert!(store.graph().has_label(syn, Labels::SYNONYM));
        assert!(!store.graph().has_label(syn, Labels::TAXON));
        assert_eq!(store.graph().parent_of(syn), None);
        assert_eq!(store.graph().parent_of(acc), Some(genus));
        // repeated call is a no-op
        assert!(!store.create_synonym_rel(syn, acc).unwrap());
    }

    #[test]
    fn synonym_rel_keeps_parent_when_accepted_has_one() {
        let (mut store, ids) = store_with(&[
            species("g1", "Abies", TaxonomicStatus::Accepted),
            species("g2", "Picea", TaxonomicStatus::Accepted),
            species("syn", "Pinus abies", TaxonomicStatus::Accepted),
            species("acc", "Picea abies", TaxonomicStatus::Accepted),
        ]);
        store.assign_parent(ids[0], ids[2]).unwrap();
        store.assign_parent(ids[1], ids[3]).unwrap();

        store.create_synonym_rel(ids[2], ids[3]).unwrap();
        assert_eq!(store.graph().parent_of(ids[2]), Some(ids[0]));
        assert_eq!(store.graph().parent_of(ids[3]), Some(ids[1]));
    }

    #[test]
    fn basionym_rel_stamps_the_homotypic_key() {
        let (mut store, ids) = store_with(&[
            species("b", "Pinus abies L.", TaxonomicStatus::Synonym),
            species("c", "Picea abies (L.) H. Karst.", TaxonomicStatus::Accepted),
        ]);
        assert!(store.create_basionym_rel(ids[0], ids[1]).unwrap());
        assert!(store.graph().has_label(ids[0], Labels::BASIONYM));
        assert_eq!(store.get(ids[0]).unwrap().name.homotypic_key, Some(ids[0]));
        assert_eq!(store.get(ids[1]).unwrap().name.homotypic_key, Some(ids[0]));
        assert!(!store.create_basionym_rel(ids[0], ids[0]).unwrap());
    }

    #[test]
    fn placeholder_is_a_doubtful_unranked_taxon() {
        let mut store = GraphStore::in_memory().unwrap();
        let id = store.create_placeholder().unwrap();
        let usage = store.get(id).unwrap();
        assert_eq!(usage.name.scientific_name.as_deref(), Some(PLACEHOLDER_NAME));
        assert_eq!(usage.name.name_type, Some(NameType::Placeholder));
        assert_eq!(usage.name.rank, Some(Rank::Unranked));
        assert_eq!(usage.status, Some(TaxonomicStatus::Doubtful));
        assert_eq!(usage.origin, Some(Origin::MissingAccepted));
        assert!(store.graph().has_label(id, Labels::TAXON));
    }

    #[test]
    fn doubtful_from_source_copies_the_classification() {
        let mut src = species("s", "Abies alba", TaxonomicStatus::Accepted);
        let mut classification = crate::types::Classification::default();
        classification.family = Some("Pinaceae".into());
        src.classification = Some(classification);
        let (mut store, ids) = store_with(&[src]);

        let mut name = Name::default();
        name.scientific_name = Some("Abies borisii".into());
        let id = store
            .create_doubtful_from_source(ids[0], name, Origin::VerbatimAccepted)
            .unwrap();
        let usage = store.get(id).unwrap();
        assert_eq!(usage.status, Some(TaxonomicStatus::Doubtful));
        assert_eq!(usage.origin, Some(Origin::VerbatimAccepted));
        assert_eq!(usage.name.origin, Some(Origin::VerbatimAccepted));
        assert_eq!(
            usage.classification.unwrap().family.as_deref(),
            Some("Pinaceae")
        );
    }

    #[test]
    fn process_sweeps_and_persists() {
        let (mut store, ids) = store_with(&[
            species("a", "A b", TaxonomicStatus::Accepted),
            species("b", "C d", TaxonomicStatus::Accepted),
            species("s", "E f", TaxonomicStatus::Synonym),
        ]);
        let n = store
            .process(Labels::TAXON, 1, |store, id| {
                store.update(id, |u| u.diagnostics.flag(Issue::TaxonomicStatusDoubtful))
            })
            .unwrap();
        assert_eq!(n, 2);
        assert!(store
            .get(ids[0])
            .unwrap()
            .diagnostics
            .has(Issue::TaxonomicStatusDoubtful));
        assert!(!store
            .get(ids[2])
            .unwrap()
            .diagnostics
            .has(Issue::TaxonomicStatusDoubtful));
    }

    #[test]
    fn process_stops_at_batch_boundary_when_interrupted() {
        let usages: Vec<NameUsage> = (0..6)
            .map(|i| species(&format!("t{i}"), "A b", TaxonomicStatus::Accepted))
            .collect();
        let (mut store, _) = store_with(&usages);
        let handle = store.interrupt_handle();
        let mut seen = 0u32;
        let err = store
            .process(Labels::TAXON, 2, |_, _| {
                seen += 1;
                handle.store(true, Ordering::Relaxed);
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CladeError::Normalization(NormalizationError::Interrupted)
        ));
        // the first batch ran to its boundary, nothing further
        assert_eq!(seen, 2);
    }

    #[test]
    fn update_labels_marks_roots_and_basionyms() {
        let (mut store, ids) = store_with(&[
            species("r", "Abies", TaxonomicStatus::Accepted),
            species("c", "Abies alba", TaxonomicStatus::Accepted),
            species("b", "Pinus abies", TaxonomicStatus::Synonym),
        ]);
        store.assign_parent(ids[0], ids[1]).unwrap();
        store.create_basionym_rel(ids[2], ids[1]).unwrap();
        store.update_labels().unwrap();

        assert!(store.graph().has_label(ids[0], Labels::ROOT));
        assert!(!store.graph().has_label(ids[1], Labels::ROOT));
        // synonyms are never roots
        assert!(!store.graph().has_label(ids[2], Labels::ROOT));
        assert!(store.graph().has_label(ids[2], Labels::BASIONYM));
    }

    #[test]
    fn sync_relations_writes_resolved_references() {
        let (mut store, ids) = store_with(&[
            species("p", "Abies", TaxonomicStatus::Accepted),
            species("c", "Abies alba", TaxonomicStatus::Accepted),
            species("s", "Pinus abies", TaxonomicStatus::Synonym),
        ]);
        store.assign_parent(ids[0], ids[1]).unwrap();
        store.create_synonym_rel(ids[2], ids[1]).unwrap();
        store.sync_relations(100).unwrap();

        assert_eq!(store.get(ids[1]).unwrap().parent_id, Some(ids[0]));
        assert_eq!(store.get(ids[2]).unwrap().accepted_ids, vec![ids[1]]);
        assert_eq!(store.get(ids[0]).unwrap().parent_id, None);
    }
}
