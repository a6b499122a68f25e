//! In-memory record source, mainly for tests and embedding.

use crate::error::SourceError;
use crate::types::{MappingFlags, VerbatimRecord};

use super::traits::{RecordSource, flags_for_terms};

/// A source over pre-built records. Mapping flags are derived from the
/// terms present unless given explicitly.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: Vec<VerbatimRecord>,
    flags: MappingFlags,
}

impl MemorySource {
    pub fn new(records: Vec<VerbatimRecord>) -> Self {
        let flags = flags_for_terms(records.iter().flat_map(|r| r.terms.keys()));
        Self { records, flags }
    }

    pub fn with_flags(records: Vec<VerbatimRecord>, flags: MappingFlags) -> Self {
        Self { records, flags }
    }
}

impl RecordSource for MemorySource {
    fn mapping_flags(&self) -> MappingFlags {
        self.flags
    }

    fn records(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = Result<VerbatimRecord, SourceError>> + '_>, SourceError>
    {
        let records = std::mem::take(&mut self.records);
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::Term;

    #[test]
    fn flags_are_derived_from_the_terms() {
        let mut rec = VerbatimRecord::new();
        rec.set(Term::ScientificName, "Abies alba");
        rec.set(Term::AcceptedNameUsageId, "9");
        rec.set(Term::Kingdom, "Plantae");
        let source = MemorySource::new(vec![rec]);

        let flags = source.mapping_flags();
        assert!(flags.accepted_name_mapped);
        assert!(flags.denormed_classification_mapped);
        assert!(!flags.parent_name_mapped);
        assert!(!flags.original_name_mapped);
    }

    #[test]
    fn records_stream_once() {
        let mut rec = VerbatimRecord::new();
        rec.set(Term::ScientificName, "Abies alba");
        let mut source = MemorySource::new(vec![rec]);

        let first: Vec<_> = source.records().unwrap().collect();
        assert_eq!(first.len(), 1);
        let second: Vec<_> = source.records().unwrap().collect();
        assert!(second.is_empty(), "sources are single-pass");
    }
}
