//! The normalizer: insertion, graph repair, storage sync, verification.
//!
//! One normalization run works through a fixed state machine:
//! Inserting -> Normalizing (passes 1-6) -> Syncing -> Verifying -> Done,
//! with Failed terminal from anywhere. There is no partial resume; a
//! failed run is simply re-run from scratch.

mod basionym_chains;
mod classification;
mod status;
mod synonym_chains;
mod synonym_cycles;
mod synonym_parents;
mod traits;
mod verify;

pub use basionym_chains::BasionymChains;
pub use classification::ClassificationApplication;
pub use status::StatusRectification;
pub use synonym_chains::SynonymChains;
pub use synonym_cycles::SynonymCycles;
pub use synonym_parents::SynonymParents;
pub use traits::{PassReport, RepairPass};
pub use verify::verify;

use tracing::info;

use crate::config::NormalizerConfig;
use crate::error::{NormalizationError, Result};
use crate::insert::{Inserter, RecordSource};
use crate::interpret::{BasicParser, NameParser};
use crate::progress::{NoopReporter, ProgressReporter};
use crate::store::GraphStore;
use crate::types::InsertionMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerState {
    Inserting,
    Normalizing,
    Syncing,
    Verifying,
    Done,
    Failed,
}

impl NormalizerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserting => "INSERTING",
            Self::Normalizing => "NORMALIZING",
            Self::Syncing => "SYNCING",
            Self::Verifying => "VERIFYING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for NormalizerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the full pipeline for one checklist over one store.
pub struct Normalizer<S: RecordSource> {
    store: GraphStore,
    source: S,
    config: NormalizerConfig,
    parser: Box<dyn NameParser>,
    reporter: Box<dyn ProgressReporter>,
    state: NormalizerState,
    meta: Option<InsertionMetadata>,
}

impl<S: RecordSource> Normalizer<S> {
    pub fn new(store: GraphStore, source: S, config: NormalizerConfig) -> Self {
        Self {
            store,
            source,
            config,
            parser: Box::new(BasicParser),
            reporter: Box::new(NoopReporter),
            state: NormalizerState::Inserting,
            meta: None,
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn NameParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn state(&self) -> NormalizerState {
        self.state
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn metadata(&self) -> Option<&InsertionMetadata> {
        self.meta.as_ref()
    }

    /// Insert every source record. Usually called through [`Self::run`],
    /// exposed separately for callers that only want the load phase.
    pub fn insert_all(&mut self) -> Result<InsertionMetadata> {
        let inserter = Inserter::new(&self.config, self.parser.as_ref(), self.reporter.as_ref());
        let meta = inserter.insert_all(&mut self.store, &mut self.source)?;
        self.store.save_metadata(&meta)?;
        self.meta = Some(meta.clone());
        Ok(meta)
    }

    /// Run the whole pipeline. On success the store is handed back open,
    /// or closed and dropped when `close_store` is set.
    pub fn run(mut self, close_store: bool) -> Result<Option<GraphStore>> {
        if let Err(err) = self.run_inner() {
            self.transition(NormalizerState::Failed);
            return Err(err);
        }
        self.transition(NormalizerState::Done);
        if close_store {
            self.store.close()?;
            Ok(None)
        } else {
            Ok(Some(self.store))
        }
    }

    fn run_inner(&mut self) -> Result<()> {
        if self.meta.is_none() {
            self.insert_all()?;
        }
        let meta = self
            .meta
            .clone()
            .ok_or_else(|| NormalizationError::SourceInvalid("insertion yielded no metadata".into()))?;
        let batch_size = self.config.insert.batch_size;

        self.transition(NormalizerState::Normalizing);
        let passes: [Box<dyn RepairPass>; 6] = [
            Box::new(SynonymCycles),
            Box::new(SynonymChains),
            Box::new(SynonymParents),
            Box::new(BasionymChains),
            Box::new(StatusRectification { batch_size }),
            Box::new(ClassificationApplication { batch_size }),
        ];
        for pass in passes {
            let report = pass.run(&mut self.store, &meta)?;
            info!(pass = pass.name(), fixes = report.fixes, "repair pass finished");
        }

        self.transition(NormalizerState::Syncing);
        self.store.update_labels()?;
        self.store.sync_relations(batch_size)?;

        self.transition(NormalizerState::Verifying);
        let checked = verify(&mut self.store, batch_size)?;
        info!(usages = checked, "verification finished");
        Ok(())
    }

    fn transition(&mut self, next: NormalizerState) {
        info!(from = %self.state, to = %next, "normalizer state change");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insert::MemorySource;
    use crate::terms::Term;
    use crate::types::{Issue, TaxonomicStatus, VerbatimRecord};
    use clade_graph::Labels;

    fn record(pairs: &[(Term, &str)]) -> VerbatimRecord {
        let mut rec = VerbatimRecord::new();
        for (term, value) in pairs {
            rec.set(*term, *value);
        }
        rec
    }

    fn normalizer(records: Vec<VerbatimRecord>) -> Normalizer<MemorySource> {
        let store = GraphStore::in_memory().unwrap();
        Normalizer::new(store, MemorySource::new(records), NormalizerConfig::default())
    }

    #[test]
    fn full_pipeline_reaches_done_and_returns_the_store() {
        let records = vec![
            record(&[
                (Term::TaxonId, "1"),
                (Term::ScientificName, "Pinaceae"),
                (Term::TaxonRank, "family"),
            ]),
            record(&[
                (Term::TaxonId, "2"),
                (Term::ScientificName, "Abies alba Mill."),
                (Term::TaxonRank, "species"),
                (Term::ParentNameUsageId, "1"),
            ]),
        ];
        let store = normalizer(records).run(false).unwrap().expect("store open");
        let species = store.by_id("2").unwrap();
        let family = store.by_id("1").unwrap();
        assert_eq!(store.graph().parent_of(species), Some(family));
        assert!(store.graph().has_label(family, Labels::ROOT));
        // resolved references were synced into the payloads
        assert_eq!(store.get(species).unwrap().parent_id, Some(family));
    }

    #[test]
    fn synonym_cycle_is_repaired_end_to_end() {
        let records = vec![
            record(&[
                (Term::TaxonId, "a"),
                (Term::ScientificName, "Aus aus"),
                (Term::AcceptedNameUsageId, "b"),
                (Term::TaxonomicStatus, "synonym"),
            ]),
            record(&[
                (Term::TaxonId, "b"),
                (Term::ScientificName, "Bus bus"),
                (Term::AcceptedNameUsageId, "a"),
                (Term::TaxonomicStatus, "synonym"),
            ]),
        ];
        let store = normalizer(records).run(false).unwrap().expect("store open");
        let a = store.by_id("a").unwrap();
        let b = store.by_id("b").unwrap();
        // both ended up with exactly one accepted and no cycle remains
        assert_eq!(store.graph().accepted_of(a).len(), 1);
        assert_eq!(store.graph().accepted_of(b).len(), 1);
        let flagged = [a, b]
            .iter()
            .filter(|id| store.get(**id).unwrap().diagnostics.has(Issue::ParentCycle))
            .count();
        assert_eq!(flagged, 1);
    }

    #[test]
    fn run_can_close_the_store() {
        let records = vec![record(&[
            (Term::TaxonId, "1"),
            (Term::ScientificName, "Abies alba"),
        ])];
        assert!(normalizer(records).run(true).unwrap().is_none());
    }

    #[test]
    fn statuses_are_rectified_during_the_run() {
        let records = vec![
            record(&[
                (Term::TaxonId, "t1"),
                (Term::ScientificName, "Tus primus"),
            ]),
            record(&[
                (Term::TaxonId, "t2"),
                (Term::ScientificName, "Tus secundus"),
            ]),
            record(&[
                (Term::TaxonId, "s"),
                (Term::ScientificName, "Sus sus"),
                (Term::AcceptedNameUsageId, "t1|t2"),
                (Term::TaxonomicStatus, "synonym"),
            ]),
        ];
        let store = normalizer(records).run(false).unwrap().expect("store open");
        let synonym = store.by_id("s").unwrap();
        let usage = store.get(synonym).unwrap();
        assert_eq!(usage.status, Some(TaxonomicStatus::AmbiguousSynonym));
        assert!(usage.diagnostics.has(Issue::DerivedTaxonomicStatus));
    }
}
