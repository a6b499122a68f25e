//! Pass 6: apply denormalized classifications.
//!
//! Source records often carry their higher classification as flat
//! rank-to-name strings. This pass turns those strings into real ancestor
//! nodes above each taxon's current highest parent, reusing existing nodes
//! where the ancestry fits and synthesizing the rest. The consumed
//! classification is cleared, which also makes the pass idempotent.

use tracing::debug;

use clade_graph::{Labels, NodeId, Rank};

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{Classification, InsertionMetadata, Issue};

use super::traits::{PassReport, RepairPass};

#[derive(Debug)]
pub struct ClassificationApplication {
    pub batch_size: usize,
}

impl RepairPass for ClassificationApplication {
    fn name(&self) -> &'static str {
        "classification application"
    }

    fn run(&self, store: &mut GraphStore, meta: &InsertionMetadata) -> Result<PassReport> {
        if !meta.mappings.denormed_classification_mapped {
            debug!("no classification columns mapped, skipping");
            return Ok(PassReport::default());
        }
        let mut fixes = 0;
        store.process(Labels::TAXON, self.batch_size, |store, id| {
            let mut usage = store.get(id)?;
            let Some(classification) = usage.classification.clone() else {
                return Ok(());
            };
            if apply(store, id, &classification)? {
                usage.classification = None;
                fixes += 1;
            } else {
                usage.diagnostics.flag(Issue::ClassificationNotApplied);
            }
            store.put(id, &usage)?;
            Ok(())
        })?;
        Ok(PassReport { fixes })
    }
}

/// Build and attach the ancestor chain for one taxon. Returns false when
/// the classification cannot be applied.
fn apply(store: &mut GraphStore, node: NodeId, classification: &Classification) -> Result<bool> {
    let highest = store.graph().highest_parent(node);
    let top_card = store.graph().card(highest)?;
    let top_rank = top_card.rank;
    let top_name = top_card.display_name().to_string();
    // With an existing ancestor of unknowable rank there is no way to tell
    // where the classification should slot in.
    if highest != node && top_rank.is_uncomparable() {
        return Ok(false);
    }
    if top_rank == Rank::Kingdom {
        return Ok(true);
    }

    let mut todo = classification.clone();
    if top_rank.is_uncomparable() {
        // only the lowest matching rank stands for the node itself
        for rank in Rank::CLASSIFICATION.into_iter().rev() {
            if todo
                .by_rank(rank)
                .is_some_and(|name| name.eq_ignore_ascii_case(&top_name))
            {
                todo.set_by_rank(rank, None);
                break;
            }
        }
    } else {
        for rank in Rank::CLASSIFICATION {
            if !rank.higher_than(top_rank) {
                todo.set_by_rank(rank, None);
            }
        }
    }
    if store.graph().has_label(highest, Labels::SYNONYM) {
        todo.genus = None;
        todo.subgenus = None;
    }

    let mut tail: Option<NodeId> = None;
    let mut tail_rank: Option<Rank> = None;
    for rank in Rank::CLASSIFICATION {
        let Some(name) = todo.by_rank(rank).map(str::to_string) else {
            continue;
        };
        let next = match find_compatible(store, node, &name, rank, tail, tail_rank, classification)?
        {
            Some(existing) => {
                if store.graph().card(existing)?.rank == Rank::Unranked {
                    store.graph_mut().card_mut(existing)?.rank = rank;
                }
                if let Some(tail) = tail {
                    if store.graph().parent_of(existing).is_none() {
                        store.assign_parent(tail, existing)?;
                    }
                }
                existing
            }
            None => {
                let created = store.create_higher_taxon(&name, rank)?;
                if let Some(tail) = tail {
                    store.assign_parent(tail, created)?;
                }
                debug!(%created, name = name.as_str(), rank = %rank, "synthesized higher taxon");
                created
            }
        };
        tail = Some(next);
        tail_rank = Some(rank);
    }
    if let Some(tail) = tail {
        if tail != highest {
            store.assign_parent(tail, highest)?;
        }
    }
    Ok(true)
}

/// An existing non-synonym node for the name and rank whose ancestry fits
/// the chain built so far.
fn find_compatible(
    store: &GraphStore,
    subject: NodeId,
    name: &str,
    rank: Rank,
    tail: Option<NodeId>,
    tail_rank: Option<Rank>,
    classification: &Classification,
) -> Result<Option<NodeId>> {
    for candidate in store.usages_by_name_and_rank(name, rank, true) {
        if candidate == subject || store.graph().has_label(candidate, Labels::SYNONYM) {
            continue;
        }
        let parent = store.graph().parent_of(candidate);
        let fits = match tail {
            // first link of the chain must not be rooted elsewhere
            None => parent.is_none(),
            Some(tail) => {
                parent.is_none()
                    || parent == Some(tail)
                    || tail_rank
                        .is_some_and(|r| store.graph().ancestor_at_rank(candidate, r) == Some(tail))
                    || store.maybe_get(candidate)?.is_some_and(|u| {
                        u.classification
                            .is_some_and(|c| c.equals_above_rank(classification, rank))
                    })
            }
        };
        if fits {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
