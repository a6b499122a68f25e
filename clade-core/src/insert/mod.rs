//! Insertion: streaming verbatim records into the graph store.
//!
//! Two phases. First every record is interpreted into a [`NameUsage`] and
//! written under bulk load, with the verbatim original kept alongside for
//! later reference resolution and review. Second, once all usages exist,
//! a [`RelationLinker`] sweep resolves accepted, parent and basionym
//! references into graph relations.

pub mod memory;
pub mod relations;
pub mod tabular;
pub mod traits;

pub use memory::MemorySource;
pub use relations::RelationLinker;
pub use tabular::TabularSource;
pub use traits::RecordSource;

use tracing::{info, warn};

use clade_graph::{Labels, Rank};

use crate::config::NormalizerConfig;
use crate::error::{NormalizationError, Result};
use crate::interpret::{Interpreter, NameParser};
use crate::progress::ProgressReporter;
use crate::store::GraphStore;
use crate::types::{InsertionMetadata, Issue, NameUsage, VerbatimKey};
use crate::validate;

/// Drives one insertion run over a record source.
pub struct Inserter<'a> {
    config: &'a NormalizerConfig,
    parser: &'a dyn NameParser,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> Inserter<'a> {
    pub fn new(
        config: &'a NormalizerConfig,
        parser: &'a dyn NameParser,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            config,
            parser,
            reporter,
        }
    }

    /// Insert every record and resolve its relations.
    pub fn insert_all(
        &self,
        store: &mut GraphStore,
        source: &mut dyn RecordSource,
    ) -> Result<InsertionMetadata> {
        let flags = source.mapping_flags();
        let mut meta = InsertionMetadata::new(flags);
        let interpreter = Interpreter::new(self.parser, self.config.dataset.code);
        let batch_size = self.config.insert.batch_size;

        store.start_bulk()?;
        self.reporter.start("inserting records", None);
        for (i, record) in source.records()?.enumerate() {
            if (i + 1) % batch_size == 0 && store.is_interrupted() {
                return Err(NormalizationError::Interrupted.into());
            }
            let mut record = record?;
            let key = VerbatimKey(i as i64 + 1);
            record.key = Some(key);
            meta.records += 1;

            let Some(mut usage) = interpreter.interpret(&record) else {
                warn!(record = key.0, "record skipped, no interpretable name");
                self.reporter.advance(1);
                continue;
            };
            usage.diagnostics.merge(validate::flag_issues(&usage.name));
            count(&mut meta, &usage);
            store.put_verbatim(key, &record)?;
            store.create_usage(&usage)?;
            self.reporter.advance(1);
        }
        self.reporter.finish();

        let duplicates = store.end_bulk()?;
        meta.duplicate_ids = duplicates.len() as u64;
        if !duplicates.is_empty() {
            if self.config.insert.strict_ids {
                return Err(NormalizationError::NotUnique(duplicates[0].clone()).into());
            }
            for id in &duplicates {
                warn!(taxon_id = id.as_str(), "duplicate source identifier");
                if let Some(node) = store.by_id(id) {
                    store.update(node, |u| u.diagnostics.flag(Issue::IdNotUnique))?;
                }
            }
        }

        if flags.parent_name_mapped || flags.accepted_name_mapped || flags.original_name_mapped {
            self.reporter.start("resolving relations", Some(meta.usages));
            let linker = RelationLinker::new(
                self.parser,
                flags,
                self.config.insert.id_delimiter.as_deref(),
            );
            let reporter = self.reporter;
            store.process(Labels::ALL, batch_size, |store, node| {
                linker.process(store, node)?;
                reporter.advance(1);
                Ok(())
            })?;
            self.reporter.finish();
        }

        meta.finish();
        info!(
            records = meta.records,
            usages = meta.usages,
            duplicates = meta.duplicate_ids,
            elapsed_ms = meta.elapsed().num_milliseconds(),
            "insertion finished"
        );
        Ok(meta)
    }
}

fn count(meta: &mut InsertionMetadata, usage: &NameUsage) {
    meta.usages += 1;
    meta.vernaculars += usage.vernacular_names.len() as u64;
    meta.distributions += usage.distributions.len() as u64;
    meta.count_rank(usage.name.rank.unwrap_or(Rank::Unranked));
}
