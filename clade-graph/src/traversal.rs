//! Explicit searches over the relation subgraphs.
//!
//! The repair passes work find-one, fix-one, requery: each call here scans
//! the current topology and returns at most one offending structure. The
//! caller mutates the graph and calls again until the search comes up empty.

use std::collections::{HashMap, HashSet};

use crate::graph::{NodeId, TaxonGraph};
use crate::{Edge, Labels, RelType};

/// A synonym pointing at another synonym, followed to its terminal.
///
/// `links` holds every SYNONYM_OF edge from the chain head down to the
/// terminal; the last link's target is `terminal`, which itself has no
/// outgoing SYNONYM_OF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymChain {
    pub links: Vec<Edge>,
    pub terminal: NodeId,
}

/// Two adjacent BASIONYM_OF edges sharing a middle node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasionymChain {
    pub first: Edge,
    pub second: Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Find one SYNONYM_OF edge that participates in a cycle.
///
/// Depth-first search over the SYNONYM_OF subgraph; an edge into a node
/// still on the stack closes a cycle. Self-loops count. The returned edge
/// is the outgoing edge of the node the cycle closes on, so the repair
/// redirects that node and leaves the rest of the loop to later requeries.
pub fn find_synonym_cycle(graph: &TaxonGraph) -> Option<Edge> {
    let mut color: HashMap<NodeId, Color> = HashMap::new();
    for start in graph.nodes(Labels::ALL) {
        if color.get(&start).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }
        color.insert(start, Color::Gray);
        let mut stack = vec![(start, graph.targets(start, RelType::SynonymOf).into_iter())];
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let source = frame.0;
            let next = frame.1.next();
            match next {
                None => {
                    color.insert(source, Color::Black);
                    stack.pop();
                }
                Some(target) => match color.get(&target).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        if target == source {
                            return Some(Edge {
                                source,
                                target,
                                rel: RelType::SynonymOf,
                            });
                        }
                        // The cycle closes on `target`; its successor on the
                        // stack is the next node along the loop.
                        let pos = stack.iter().position(|(node, _)| *node == target)?;
                        let next = stack.get(pos + 1).map_or(source, |(node, _)| *node);
                        return Some(Edge {
                            source: target,
                            target: next,
                            rel: RelType::SynonymOf,
                        });
                    }
                    Color::White => {
                        color.insert(target, Color::Gray);
                        stack.push((target, graph.targets(target, RelType::SynonymOf).into_iter()));
                    }
                    Color::Black => {}
                },
            }
        }
    }
    None
}

/// Find one synonym chain: a SYNONYM_OF edge whose target is itself a
/// synonym of something else. Cyclic structures are skipped; cutting those
/// is a separate repair.
pub fn find_synonym_chain(graph: &TaxonGraph) -> Option<SynonymChain> {
    for edge in graph.edges(RelType::SynonymOf) {
        if graph.out_degree(edge.target, RelType::SynonymOf) == 0 {
            continue;
        }
        if let Some(chain) = walk_chain(graph, edge) {
            return Some(chain);
        }
    }
    None
}

/// Follow a chain head to its terminal. Pro parte synonyms branch; the
/// walk follows the first outgoing edge. Returns None on a cycle.
fn walk_chain(graph: &TaxonGraph, head: Edge) -> Option<SynonymChain> {
    let mut seen = HashSet::from([head.source, head.target]);
    let mut links = vec![head];
    let mut current = head.target;
    loop {
        let outgoing = graph.outgoing(current, RelType::SynonymOf);
        let Some(next) = outgoing.first() else {
            return Some(SynonymChain {
                links,
                terminal: current,
            });
        };
        if !seen.insert(next.target) {
            return None;
        }
        links.push(*next);
        current = next.target;
    }
}

/// Find one basionym chain: a node with both an incoming and an outgoing
/// BASIONYM_OF edge.
pub fn find_basionym_chain(graph: &TaxonGraph) -> Option<BasionymChain> {
    for middle in graph.nodes(Labels::ALL) {
        let incoming = graph.incoming(middle, RelType::BasionymOf);
        let outgoing = graph.outgoing(middle, RelType::BasionymOf);
        if let (Some(first), Some(second)) = (incoming.first(), outgoing.first()) {
            return Some(BasionymChain {
                first: *first,
                second: *second,
            });
        }
    }
    None
}
