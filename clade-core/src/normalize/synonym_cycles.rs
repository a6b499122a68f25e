//! Pass 1: cut SYNONYM_OF cycles.
//!
//! Each fix redirects the node the cycle closes on to a fresh placeholder
//! accepted taxon and deletes its outgoing edge. One cut per iteration;
//! every cut strictly reduces the cycle count, so the loop terminates.

use tracing::debug;

use clade_graph::traversal;

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{InsertionMetadata, Issue};

use super::traits::{PassReport, RepairPass};

#[derive(Debug)]
pub struct SynonymCycles;

impl RepairPass for SynonymCycles {
    fn name(&self) -> &'static str {
        "synonym cycles"
    }

    fn run(&self, store: &mut GraphStore, _meta: &InsertionMetadata) -> Result<PassReport> {
        let mut fixes = 0;
        while let Some(edge) = traversal::find_synonym_cycle(store.graph()) {
            store.begin()?;
            store.graph_mut().delete_rel(&edge);
            let placeholder = store.create_placeholder()?;
            store.create_synonym_rel(edge.source, placeholder)?;
            store.update(edge.source, |u| {
                u.diagnostics.flag(Issue::ChainedSynonym);
                u.diagnostics.flag(Issue::ParentCycle);
            })?;
            store.commit()?;
            debug!(synonym = %edge.source, %placeholder, "cut a synonym cycle");
            fixes += 1;
        }
        Ok(PassReport { fixes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::store::PLACEHOLDER_NAME;
    use crate::types::{NameUsage, TaxonomicStatus};
    use clade_graph::{NodeId, Rank, RelType};

    fn synonym(store: &mut GraphStore, name: &str) -> NodeId {
        let mut n = Name::default();
        n.scientific_name = Some(name.to_string());
        n.rank = Some(Rank::Species);
        let mut u = NameUsage::new(n);
        u.status = Some(TaxonomicStatus::Synonym);
        store.create_usage(&u).unwrap()
    }

    fn run(store: &mut GraphStore) -> PassReport {
        let meta = InsertionMetadata::new(Default::default());
        SynonymCycles.run(store, &meta).unwrap()
    }

    #[test]
    fn three_cycle_is_redirected_to_a_placeholder() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = synonym(&mut store, "Aus aus");
        let b = synonym(&mut store, "Bus bus");
        let c = synonym(&mut store, "Cus cus");
        let g = store.graph_mut();
        g.create_rel(a, b, RelType::SynonymOf).unwrap();
        g.create_rel(b, c, RelType::SynonymOf).unwrap();
        g.create_rel(c, a, RelType::SynonymOf).unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 1);

        // a now points at a placeholder, the rest of the loop is intact
        let accepted = store.graph().accepted_of(a);
        assert_eq!(accepted.len(), 1);
        let placeholder = store.get(accepted[0]).unwrap();
        assert_eq!(
            placeholder.name.scientific_name.as_deref(),
            Some(PLACEHOLDER_NAME)
        );
        assert!(store.graph().has_rel(b, c, RelType::SynonymOf));
        assert!(store.graph().has_rel(c, a, RelType::SynonymOf));

        let cut = store.get(a).unwrap();
        assert!(cut.diagnostics.has(Issue::ChainedSynonym));
        assert!(cut.diagnostics.has(Issue::ParentCycle));
        assert!(store.get(b).unwrap().diagnostics.is_clean());

        assert!(traversal::find_synonym_cycle(store.graph()).is_none());
    }

    #[test]
    fn self_loop_is_cut() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = synonym(&mut store, "Aus aus");
        store
            .graph_mut()
            .create_rel(a, a, RelType::SynonymOf)
            .unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 1);
        assert!(!store.graph().has_rel(a, a, RelType::SynonymOf));
        assert_eq!(store.graph().accepted_of(a).len(), 1);
    }

    #[test]
    fn acyclic_graph_is_untouched() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = synonym(&mut store, "Aus aus");
        let b = synonym(&mut store, "Bus bus");
        store
            .graph_mut()
            .create_rel(a, b, RelType::SynonymOf)
            .unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 0);
        assert!(store.graph().has_rel(a, b, RelType::SynonymOf));
    }

    #[test]
    fn two_independent_cycles_take_two_fixes() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = synonym(&mut store, "Aus aus");
        let b = synonym(&mut store, "Bus bus");
        let c = synonym(&mut store, "Cus cus");
        let d = synonym(&mut store, "Dus dus");
        let g = store.graph_mut();
        g.create_rel(a, b, RelType::SynonymOf).unwrap();
        g.create_rel(b, a, RelType::SynonymOf).unwrap();
        g.create_rel(c, d, RelType::SynonymOf).unwrap();
        g.create_rel(d, c, RelType::SynonymOf).unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 2);
        assert!(traversal::find_synonym_cycle(store.graph()).is_none());
    }
}
