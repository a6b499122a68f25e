//! Pass 2: relink multi-hop SYNONYM_OF chains.
//!
//! After pass 1 the SYNONYM_OF subgraph is acyclic, so every chain ends at
//! a node with no outgoing SYNONYM_OF. Each intermediate synonym is
//! redirected straight to that terminal; afterwards no SYNONYM_OF path of
//! length greater than one remains.

use tracing::debug;

use clade_graph::traversal;

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{InsertionMetadata, Issue};

use super::traits::{PassReport, RepairPass};

#[derive(Debug)]
pub struct SynonymChains;

impl RepairPass for SynonymChains {
    fn name(&self) -> &'static str {
        "synonym chains"
    }

    fn run(&self, store: &mut GraphStore, _meta: &InsertionMetadata) -> Result<PassReport> {
        let mut fixes = 0;
        while let Some(chain) = traversal::find_synonym_chain(store.graph()) {
            store.begin()?;
            let terminal = chain.terminal;
            // The last link already points at the terminal and stays.
            for link in &chain.links[..chain.links.len() - 1] {
                store.graph_mut().delete_rel(link);
                store.create_synonym_rel(link.source, terminal)?;
                store.update(link.source, |u| u.diagnostics.flag(Issue::ChainedSynonym))?;
                debug!(synonym = %link.source, %terminal, "relinked a chained synonym");
                fixes += 1;
            }
            store.commit()?;
        }
        Ok(PassReport { fixes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::types::{NameUsage, TaxonomicStatus};
    use clade_graph::{NodeId, Rank, RelType};

    fn usage(store: &mut GraphStore, name: &str, status: TaxonomicStatus) -> NodeId {
        let mut n = Name::default();
        n.scientific_name = Some(name.to_string());
        n.rank = Some(Rank::Species);
        let mut u = NameUsage::new(n);
        u.status = Some(status);
        store.create_usage(&u).unwrap()
    }

    fn run(store: &mut GraphStore) -> PassReport {
        let meta = InsertionMetadata::new(Default::default());
        SynonymChains.run(store, &meta).unwrap()
    }

    #[test]
    fn chain_of_three_collapses_onto_the_terminal() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = usage(&mut store, "Aus aus", TaxonomicStatus::Synonym);
        let b = usage(&mut store, "Bus bus", TaxonomicStatus::Synonym);
        let c = usage(&mut store, "Cus cus", TaxonomicStatus::Synonym);
        let acc = usage(&mut store, "Dus dus", TaxonomicStatus::Accepted);
        let g = store.graph_mut();
        g.create_rel(a, b, RelType::SynonymOf).unwrap();
        g.create_rel(b, c, RelType::SynonymOf).unwrap();
        g.create_rel(c, acc, RelType::SynonymOf).unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 2);

        for syn in [a, b, c] {
            assert_eq!(store.graph().accepted_of(syn), vec![acc]);
            assert_eq!(store.graph().out_degree(syn, RelType::SynonymOf), 1);
        }
        assert!(store.get(a).unwrap().diagnostics.has(Issue::ChainedSynonym));
        assert!(store.get(b).unwrap().diagnostics.has(Issue::ChainedSynonym));
        // the final link was never touched
        assert!(!store.get(c).unwrap().diagnostics.has(Issue::ChainedSynonym));
    }

    #[test]
    fn direct_synonyms_are_untouched() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = usage(&mut store, "Aus aus", TaxonomicStatus::Synonym);
        let acc = usage(&mut store, "Bus bus", TaxonomicStatus::Accepted);
        store
            .graph_mut()
            .create_rel(a, acc, RelType::SynonymOf)
            .unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 0);
        assert!(store.get(a).unwrap().diagnostics.is_clean());
    }

    #[test]
    fn no_multi_hop_path_survives() {
        let mut store = GraphStore::in_memory().unwrap();
        let acc = usage(&mut store, "Zus zus", TaxonomicStatus::Accepted);
        let mut prev = acc;
        let mut all = vec![];
        for i in 0..5 {
            let syn = usage(&mut store, &format!("Syn {i}"), TaxonomicStatus::Synonym);
            store
                .graph_mut()
                .create_rel(syn, prev, RelType::SynonymOf)
                .unwrap();
            all.push(syn);
            prev = syn;
        }

        run(&mut store);
        for syn in all {
            assert_eq!(store.graph().accepted_of(syn), vec![acc]);
        }
        assert!(traversal::find_synonym_chain(store.graph()).is_none());
    }
}
