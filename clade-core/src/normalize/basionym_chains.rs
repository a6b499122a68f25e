//! Pass 4: cut BASIONYM_OF chains.
//!
//! A name has at most one original name, so for b1 -> b2 -> x one of the
//! two adjacent edges has to go. The edge whose source claims more
//! basionym relations is the less trustworthy one and is deleted; on a tie
//! the first edge goes. The surviving edge's target is flagged.

use tracing::debug;

use clade_graph::traversal;

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{InsertionMetadata, Issue};

use super::traits::{PassReport, RepairPass};

#[derive(Debug)]
pub struct BasionymChains;

impl RepairPass for BasionymChains {
    fn name(&self) -> &'static str {
        "basionym chains"
    }

    fn run(&self, store: &mut GraphStore, _meta: &InsertionMetadata) -> Result<PassReport> {
        let mut fixes = 0;
        while let Some(chain) = traversal::find_basionym_chain(store.graph()) {
            store.begin()?;
            let first_degree = store.graph().out_degree(chain.first.source, chain.first.rel);
            let second_degree = store.graph().out_degree(chain.second.source, chain.second.rel);
            let (cut, keep) = if second_degree > first_degree {
                (chain.second, chain.first)
            } else {
                (chain.first, chain.second)
            };
            store.graph_mut().delete_rel(&cut);
            store.update(keep.target, |u| u.diagnostics.flag(Issue::ChainedBasionym))?;
            store.commit()?;
            debug!(source = %cut.source, target = %cut.target, "cut a basionym chain");
            fixes += 1;
        }
        Ok(PassReport { fixes })
    }
}
