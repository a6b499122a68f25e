//! Pass 5: rectify declared taxonomic status against the graph.
//!
//! After passes 1-3 every synonym points directly at accepted taxa, so the
//! structure itself now tells us which synonyms are ambiguous (more than
//! one accepted) and a text heuristic spots misapplied names. Declared
//! status is reconciled against both signals.

use tracing::debug;

use clade_graph::{Labels, RelType};

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{InsertionMetadata, Issue, NameUsage, TaxonomicStatus};

use super::traits::{PassReport, RepairPass};

#[derive(Debug)]
pub struct StatusRectification {
    pub batch_size: usize,
}

impl RepairPass for StatusRectification {
    fn name(&self) -> &'static str {
        "status rectification"
    }

    fn run(&self, store: &mut GraphStore, _meta: &InsertionMetadata) -> Result<PassReport> {
        let mut fixes = 0;
        store.process(Labels::SYNONYM, self.batch_size, |store, id| {
            let mut usage = store.get(id)?;
            let Some(declared) = usage.status else {
                return Ok(());
            };
            let ambiguous = store.graph().out_degree(id, RelType::SynonymOf) > 1;
            let misapplied = is_misapplied(&usage);

            let rectified = match declared {
                TaxonomicStatus::Misapplied if !misapplied => {
                    usage.diagnostics.flag(Issue::TaxonomicStatusDoubtful);
                    None
                }
                TaxonomicStatus::AmbiguousSynonym if misapplied => {
                    Some(TaxonomicStatus::Misapplied)
                }
                TaxonomicStatus::AmbiguousSynonym if !ambiguous => {
                    usage.diagnostics.flag(Issue::TaxonomicStatusDoubtful);
                    None
                }
                TaxonomicStatus::Synonym if misapplied => Some(TaxonomicStatus::Misapplied),
                TaxonomicStatus::Synonym if ambiguous => Some(TaxonomicStatus::AmbiguousSynonym),
                _ => None,
            };
            if let Some(status) = rectified {
                debug!(node = %id, from = %declared, to = %status, "rectified taxonomic status");
                usage.status = Some(status);
                usage.diagnostics.flag(Issue::DerivedTaxonomicStatus);
                fixes += 1;
            }
            store.put(id, &usage)?;
            Ok(())
        })?;
        Ok(PassReport { fixes })
    }
}

/// Misapplied-name heuristic: a standalone "auct.", "sensu", "non" or
/// "nec" marker in the according-to or the full name string.
fn is_misapplied(usage: &NameUsage) -> bool {
    let mut texts: Vec<&str> = Vec::new();
    if let Some(according_to) = usage.according_to.as_deref() {
        texts.push(according_to);
    }
    if let Some(scientific) = usage.name.scientific_name.as_deref() {
        texts.push(scientific);
    }
    texts.iter().any(|text| {
        text.split_whitespace().any(|word| {
            let word = word
                .trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_ascii_lowercase();
            matches!(word.as_str(), "auct" | "auctt" | "sensu" | "non" | "nec")
        })
    })
}
