//! Pass 3: strip PARENT_OF edges from synonym nodes.
//!
//! A node cannot be both a synonym and a structural parent. Children of a
//! synonym move to its accepted taxon; parents of a synonym move to an
//! accepted taxon that still lacks one, and only when the parent's rank
//! actually sits above it. Every offending edge is deleted either way.

use tracing::{debug, warn};

use clade_graph::{Labels, NodeId, RelType, TaxonGraph};

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::InsertionMetadata;

use super::traits::{PassReport, RepairPass};

#[derive(Debug)]
pub struct SynonymParents;

impl RepairPass for SynonymParents {
    fn name(&self) -> &'static str {
        "synonym parents"
    }

    fn run(&self, store: &mut GraphStore, _meta: &InsertionMetadata) -> Result<PassReport> {
        let mut fixes = 0;
        while let Some(synonym) = find_conflicted(store.graph()) {
            store.begin()?;
            self.fix(store, synonym)?;
            store.commit()?;
            fixes += 1;
        }
        Ok(PassReport { fixes })
    }
}

impl SynonymParents {
    fn fix(&self, store: &mut GraphStore, synonym: NodeId) -> Result<()> {
        let accepted = store.graph().accepted_of(synonym);
        let synonym_name = store.graph().card(synonym)?.display_name().to_string();

        for edge in store.graph().outgoing(synonym, RelType::ParentOf) {
            store.graph_mut().delete_rel(&edge);
            let Some(target) = accepted.first() else {
                debug!(%synonym, child = %edge.target, "synonym has no accepted, child detached");
                continue;
            };
            if accepted.len() > 1 {
                warn!(%synonym, "pro parte synonym was a parent, using its first accepted");
            }
            store.assign_parent(*target, edge.target)?;
            let remark = format!("Parent relation taken from synonym {synonym_name}");
            store.update(edge.target, |u| u.diagnostics.remark(remark))?;
        }

        for edge in store.graph().incoming(synonym, RelType::ParentOf) {
            store.graph_mut().delete_rel(&edge);
            let parent_rank = store.graph().card(edge.source)?.rank;
            for acc in &accepted {
                if store.graph().parent_of(*acc).is_some() {
                    continue;
                }
                let acc_rank = store.graph().card(*acc)?.rank;
                if parent_rank.is_uncomparable() || parent_rank.higher_than(acc_rank) {
                    store.assign_parent(edge.source, *acc)?;
                    let remark = format!("Parent relation taken from synonym {synonym_name}");
                    store.update(*acc, |u| u.diagnostics.remark(remark))?;
                    debug!(parent = %edge.source, accepted = %acc, %synonym,
                        "moved parent from synonym to accepted taxon");
                }
            }
        }
        Ok(())
    }
}

fn find_conflicted(graph: &TaxonGraph) -> Option<NodeId> {
    graph.nodes(Labels::SYNONYM).find(|id| {
        graph.out_degree(*id, RelType::ParentOf) > 0 || graph.in_degree(*id, RelType::ParentOf) > 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::types::{NameUsage, TaxonomicStatus};
    use clade_graph::Rank;

    fn usage(store: &mut GraphStore, name: &str, rank: Rank, status: TaxonomicStatus) -> NodeId {
        let mut n = Name::default();
        n.scientific_name = Some(name.to_string());
        n.rank = Some(rank);
        let mut u = NameUsage::new(n);
        u.status = Some(status);
        store.create_usage(&u).unwrap()
    }

    fn run(store: &mut GraphStore) -> PassReport {
        let meta = InsertionMetadata::new(Default::default());
        SynonymParents.run(store, &meta).unwrap()
    }

    #[test]
    fn child_of_a_pro_parte_synonym_moves_to_the_first_accepted() {
        let mut store = GraphStore::in_memory().unwrap();
        let t1 = usage(&mut store, "Tus primus", Rank::Species, TaxonomicStatus::Accepted);
        let t2 = usage(&mut store, "Tus secundus", Rank::Species, TaxonomicStatus::Accepted);
        let s = usage(&mut store, "Sus sus", Rank::Species, TaxonomicStatus::Synonym);
        let x = usage(&mut store, "Xus xus", Rank::Subspecies, TaxonomicStatus::Accepted);
        let g = store.graph_mut();
        g.create_rel(s, t1, RelType::SynonymOf).unwrap();
        g.create_rel(s, t2, RelType::SynonymOf).unwrap();
        g.create_rel(s, x, RelType::ParentOf).unwrap();

        let report = run(&mut store);
        assert_eq!(report.fixes, 1);
        assert_eq!(store.graph().parent_of(x), Some(t1));
        assert!(!store.graph().has_rel(s, x, RelType::ParentOf));
        let remarks = store.get(x).unwrap().diagnostics.remarks;
        assert_eq!(remarks, vec!["Parent relation taken from synonym Sus sus"]);
    }

    #[test]
    fn incoming_parent_moves_to_a_parentless_accepted_of_higher_rank() {
        let mut store = GraphStore::in_memory().unwrap();
        let genus = usage(&mut store, "Gus", Rank::Genus, TaxonomicStatus::Accepted);
        let s = usage(&mut store, "Sus sus", Rank::Species, TaxonomicStatus::Synonym);
        let acc = usage(&mut store, "Aus aus", Rank::Species, TaxonomicStatus::Accepted);
        let g = store.graph_mut();
        g.create_rel(s, acc, RelType::SynonymOf).unwrap();
        g.create_rel(genus, s, RelType::ParentOf).unwrap();

        run(&mut store);
        assert_eq!(store.graph().parent_of(acc), Some(genus));
        assert_eq!(store.graph().parent_of(s), None);
        let remarks = store.get(acc).unwrap().diagnostics.remarks;
        assert_eq!(remarks, vec!["Parent relation taken from synonym Sus sus"]);
    }

    #[test]
    fn incoming_parent_of_equal_rank_is_dropped() {
        let mut store = GraphStore::in_memory().unwrap();
        let other = usage(&mut store, "Ous ous", Rank::Species, TaxonomicStatus::Accepted);
        let s = usage(&mut store, "Sus sus", Rank::Species, TaxonomicStatus::Synonym);
        let acc = usage(&mut store, "Aus aus", Rank::Species, TaxonomicStatus::Accepted);
        let g = store.graph_mut();
        g.create_rel(s, acc, RelType::SynonymOf).unwrap();
        g.create_rel(other, s, RelType::ParentOf).unwrap();

        run(&mut store);
        assert_eq!(store.graph().parent_of(acc), None);
        assert_eq!(store.graph().parent_of(s), None);
    }

    #[test]
    fn accepted_with_a_parent_keeps_it() {
        let mut store = GraphStore::in_memory().unwrap();
        let g1 = usage(&mut store, "Gus", Rank::Genus, TaxonomicStatus::Accepted);
        let g2 = usage(&mut store, "Hus", Rank::Genus, TaxonomicStatus::Accepted);
        let s = usage(&mut store, "Sus sus", Rank::Species, TaxonomicStatus::Synonym);
        let acc = usage(&mut store, "Aus aus", Rank::Species, TaxonomicStatus::Accepted);
        let g = store.graph_mut();
        g.create_rel(s, acc, RelType::SynonymOf).unwrap();
        g.create_rel(g1, acc, RelType::ParentOf).unwrap();
        g.create_rel(g2, s, RelType::ParentOf).unwrap();

        run(&mut store);
        assert_eq!(store.graph().parent_of(acc), Some(g1));
        assert_eq!(store.graph().parent_of(s), None);
    }

    #[test]
    fn synonym_without_accepted_leaves_the_child_detached() {
        let mut store = GraphStore::in_memory().unwrap();
        let s = usage(&mut store, "Sus sus", Rank::Species, TaxonomicStatus::Synonym);
        let x = usage(&mut store, "Xus xus", Rank::Subspecies, TaxonomicStatus::Accepted);
        store.graph_mut().create_rel(s, x, RelType::ParentOf).unwrap();

        run(&mut store);
        assert_eq!(store.graph().parent_of(x), None);
        assert!(!store.graph().has_rel(s, x, RelType::ParentOf));
    }
}
