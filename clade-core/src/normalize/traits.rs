//! The repair-pass seam.

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::InsertionMetadata;

/// What one pass did to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub fixes: u64,
}

/// One graph-repair pass.
///
/// Passes run in a fixed order and each one works find-one, fix-one,
/// requery until its target pattern no longer occurs. Later passes rely
/// on the invariants established by earlier ones.
pub trait RepairPass {
    fn name(&self) -> &'static str;

    fn run(&self, store: &mut GraphStore, meta: &InsertionMetadata) -> Result<PassReport>;
}
