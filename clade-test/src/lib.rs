// Integration test utilities and checklist fixtures for Clade.

use std::path::Path;

use clade_core::config::NormalizerConfig;
use clade_core::insert::MemorySource;
use clade_core::normalize::Normalizer;
use clade_core::store::GraphStore;
use clade_core::terms::Term;
use clade_core::types::{NameUsage, VerbatimRecord};
use clade_graph::NodeId;

/// Column order used when a fixture is written out as a TSV file.
const COLUMN_ORDER: [Term; 12] = [
    Term::TaxonId,
    Term::ScientificName,
    Term::ScientificNameAuthorship,
    Term::TaxonRank,
    Term::TaxonomicStatus,
    Term::AcceptedNameUsageId,
    Term::ParentNameUsageId,
    Term::OriginalNameUsageId,
    Term::NameAccordingTo,
    Term::Kingdom,
    Term::Order,
    Term::Family,
];

/// Fluent builder for small checklist fixtures.
///
/// Each `taxon` call starts a new row; the modifiers apply to the row
/// started last. The finished fixture becomes a [`MemorySource`] or a
/// TSV directory for the tabular reader.
#[derive(Debug, Default)]
pub struct ChecklistBuilder {
    rows: Vec<VerbatimRecord>,
}

impl ChecklistBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new row with an identifier and a scientific name.
    #[must_use]
    pub fn taxon(mut self, id: &str, name: &str) -> Self {
        let mut row = VerbatimRecord::new();
        row.set(Term::TaxonId, id);
        row.set(Term::ScientificName, name);
        self.rows.push(row);
        self
    }

    #[must_use]
    pub fn rank(self, rank: &str) -> Self {
        self.col(Term::TaxonRank, rank)
    }

    #[must_use]
    pub fn status(self, status: &str) -> Self {
        self.col(Term::TaxonomicStatus, status)
    }

    #[must_use]
    pub fn accepted(self, id: &str) -> Self {
        self.col(Term::AcceptedNameUsageId, id)
    }

    #[must_use]
    pub fn parent(self, id: &str) -> Self {
        self.col(Term::ParentNameUsageId, id)
    }

    #[must_use]
    pub fn basionym(self, id: &str) -> Self {
        self.col(Term::OriginalNameUsageId, id)
    }

    /// Set an arbitrary term on the row started last.
    #[must_use]
    pub fn col(mut self, term: Term, value: &str) -> Self {
        let row = self.rows.last_mut().expect("call taxon() first");
        row.set(term, value);
        self
    }

    pub fn records(self) -> Vec<VerbatimRecord> {
        self.rows
    }

    pub fn source(self) -> MemorySource {
        MemorySource::new(self.rows)
    }

    /// Write the fixture as `taxon.txt` for the tabular reader.
    pub fn write_tsv(&self, dir: &Path) {
        let columns: Vec<Term> = COLUMN_ORDER
            .into_iter()
            .filter(|term| self.rows.iter().any(|row| row.terms.contains_key(term)))
            .collect();
        let mut out = String::new();
        out.push_str(
            &columns
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join("\t"),
        );
        out.push('\n');
        for row in &self.rows {
            let line: Vec<&str> = columns
                .iter()
                .map(|term| row.terms.get(term).map_or("", String::as_str))
                .collect();
            out.push_str(&line.join("\t"));
            out.push('\n');
        }
        std::fs::write(dir.join("taxon.txt"), out).expect("write fixture");
    }
}

/// Run the full pipeline over an in-memory store and hand it back open.
pub fn normalize(builder: ChecklistBuilder) -> GraphStore {
    normalize_with(builder, NormalizerConfig::default())
}

pub fn normalize_with(builder: ChecklistBuilder, config: NormalizerConfig) -> GraphStore {
    try_normalize_with(builder, config)
        .expect("normalization run")
        .expect("store kept open")
}

/// Like [`normalize_with`] but hands failures back for assertions.
pub fn try_normalize_with(
    builder: ChecklistBuilder,
    config: NormalizerConfig,
) -> clade_core::error::Result<Option<GraphStore>> {
    let store = GraphStore::in_memory().expect("in-memory store");
    Normalizer::new(store, builder.source(), config).run(false)
}

/// Node for a source identifier; panics when the id is unknown.
pub fn node(store: &GraphStore, taxon_id: &str) -> NodeId {
    store
        .by_id(taxon_id)
        .unwrap_or_else(|| panic!("no node for taxon id {taxon_id}"))
}

/// Stored usage for a source identifier.
pub fn usage(store: &GraphStore, taxon_id: &str) -> NameUsage {
    let id = node(store, taxon_id);
    store.get(id).expect("usage payload")
}
