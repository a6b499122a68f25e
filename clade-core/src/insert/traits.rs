//! The record-source seam.

use crate::error::SourceError;
use crate::types::{MappingFlags, VerbatimRecord};

/// A stream of verbatim records from one checklist.
///
/// Sources are finite and single-pass: `records` may be called once per
/// run. The mapping flags must be known up front so the inserter can plan
/// the relation and classification work.
pub trait RecordSource {
    /// Which cross-reference terms the source maps.
    fn mapping_flags(&self) -> MappingFlags;

    /// The record stream, lazy where the backing medium allows it.
    fn records(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = Result<VerbatimRecord, SourceError>> + '_>, SourceError>;
}

/// Derive mapping flags from the terms a header (or record set) uses.
pub(crate) fn flags_for_terms<'a>(terms: impl Iterator<Item = &'a crate::terms::Term>) -> MappingFlags {
    use crate::terms::Term;

    let mut flags = MappingFlags::default();
    for term in terms {
        match term {
            Term::ParentNameUsageId | Term::ParentNameUsage => flags.parent_name_mapped = true,
            Term::AcceptedNameUsageId | Term::AcceptedNameUsage => {
                flags.accepted_name_mapped = true;
            }
            Term::OriginalNameUsageId | Term::OriginalNameUsage => {
                flags.original_name_mapped = true;
            }
            Term::Kingdom
            | Term::Phylum
            | Term::Class
            | Term::Order
            | Term::Superfamily
            | Term::Family => flags.denormed_classification_mapped = true,
            _ => {}
        }
    }
    flags
}
