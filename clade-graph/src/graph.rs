//! The node arena.
//!
//! Topology lives in a [`petgraph::stable_graph::StableDiGraph`] whose node
//! weights are small [`NodeCard`] values: labels, rank and the name strings
//! needed for lookups and log lines. Everything else about a usage stays in
//! the payload store and is hydrated on demand.
//!
//! Parallel edges are restricted to one edge per `(source, target, rel)`
//! triple, so an owned [`Edge`] value identifies a relation unambiguously.

use std::collections::HashSet;

use petgraph::Direction::{Incoming, Outgoing};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::rank::Rank;
use crate::{Edge, GraphError, Labels, RelType, Result};

/// Dense node identifier, stable for the lifetime of the graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> NodeIndex {
        NodeIndex::new(self.0 as usize)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn from_index(index: NodeIndex) -> Self {
        // The arena uses u32 indices.
        Self(index.index() as u32)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeId> for i64 {
    fn from(id: NodeId) -> i64 {
        i64::from(id.0)
    }
}

impl TryFrom<i64> for NodeId {
    type Error = std::num::TryFromIntError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        Ok(Self(u32::try_from(value)?))
    }
}

/// The per-node weight mirrored into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCard {
    pub labels: Labels,
    pub rank: Rank,
    pub scientific_name: String,
    pub canonical_name: Option<String>,
    pub authorship: Option<String>,
}

impl NodeCard {
    pub fn new(labels: Labels, rank: Rank, scientific_name: impl Into<String>) -> Self {
        Self {
            labels,
            rank,
            scientific_name: scientific_name.into(),
            canonical_name: None,
            authorship: None,
        }
    }

    /// Name used in log lines and remarks.
    pub fn display_name(&self) -> &str {
        if self.scientific_name.is_empty() {
            self.canonical_name.as_deref().unwrap_or("?")
        } else {
            &self.scientific_name
        }
    }
}

/// In-memory taxonomy graph: usage nodes plus PARENT_OF, SYNONYM_OF and
/// BASIONYM_OF relations.
#[derive(Debug, Default)]
pub struct TaxonGraph {
    graph: StableDiGraph<NodeCard, RelType>,
}

impl TaxonGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn add_node(&mut self, card: NodeCard) -> NodeId {
        NodeId::from_index(self.graph.add_node(card))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.graph.contains_node(id.index())
    }

    pub fn card(&self, id: NodeId) -> Result<&NodeCard> {
        self.graph
            .node_weight(id.index())
            .ok_or(GraphError::MissingNode(id))
    }

    pub fn card_mut(&mut self, id: NodeId) -> Result<&mut NodeCard> {
        self.graph
            .node_weight_mut(id.index())
            .ok_or(GraphError::MissingNode(id))
    }

    // ── Labels ─────────────────────────────────────────────────────

    /// False for missing nodes, so sweeps can query without hydrating.
    pub fn has_label(&self, id: NodeId, label: Labels) -> bool {
        self.graph
            .node_weight(id.index())
            .is_some_and(|card| card.labels.has(label))
    }

    pub fn set_label(&mut self, id: NodeId, label: Labels) -> Result<()> {
        self.card_mut(id)?.labels.set(label);
        Ok(())
    }

    pub fn unset_label(&mut self, id: NodeId, label: Labels) -> Result<()> {
        self.card_mut(id)?.labels.unset(label);
        Ok(())
    }

    /// All nodes carrying `label`, in insertion order. `Labels::ALL`
    /// matches every node.
    pub fn nodes(&self, label: Labels) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .node_indices()
            .filter(move |idx| self.graph[*idx].labels.has(label))
            .map(NodeId::from_index)
    }

    // ── Relations ──────────────────────────────────────────────────

    /// Create a relation. Returns false when the identical relation
    /// already exists, keeping `(source, target, rel)` triples unique.
    pub fn create_rel(&mut self, source: NodeId, target: NodeId, rel: RelType) -> Result<bool> {
        if !self.contains(source) {
            return Err(GraphError::MissingNode(source));
        }
        if !self.contains(target) {
            return Err(GraphError::MissingNode(target));
        }
        if self.has_rel(source, target, rel) {
            return Ok(false);
        }
        self.graph.add_edge(source.index(), target.index(), rel);
        Ok(true)
    }

    /// Delete one relation. Returns false when it no longer exists,
    /// which the requery loops treat as already repaired.
    pub fn delete_rel(&mut self, edge: &Edge) -> bool {
        match self.find_edge_index(edge) {
            Some(idx) => self.graph.remove_edge(idx).is_some(),
            None => false,
        }
    }

    pub fn has_rel(&self, source: NodeId, target: NodeId, rel: RelType) -> bool {
        self.find_edge_index(&Edge {
            source,
            target,
            rel,
        })
        .is_some()
    }

    fn find_edge_index(&self, edge: &Edge) -> Option<EdgeIndex> {
        if !self.contains(edge.source) {
            return None;
        }
        self.graph
            .edges_directed(edge.source.index(), Outgoing)
            .find(|e| e.target() == edge.target.index() && *e.weight() == edge.rel)
            .map(|e| e.id())
    }

    pub fn out_degree(&self, id: NodeId, rel: RelType) -> usize {
        self.outgoing(id, rel).len()
    }

    pub fn in_degree(&self, id: NodeId, rel: RelType) -> usize {
        self.incoming(id, rel).len()
    }

    /// Outgoing relations of one kind, as owned edges in insertion order.
    pub fn outgoing(&self, id: NodeId, rel: RelType) -> Vec<Edge> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut edges: Vec<Edge> = self
            .graph
            .edges_directed(id.index(), Outgoing)
            .filter(|e| *e.weight() == rel)
            .map(|e| Edge {
                source: id,
                target: NodeId::from_index(e.target()),
                rel,
            })
            .collect();
        // petgraph walks adjacency lists newest-first
        edges.reverse();
        edges
    }

    /// Incoming relations of one kind, as owned edges in insertion order.
    pub fn incoming(&self, id: NodeId, rel: RelType) -> Vec<Edge> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut edges: Vec<Edge> = self
            .graph
            .edges_directed(id.index(), Incoming)
            .filter(|e| *e.weight() == rel)
            .map(|e| Edge {
                source: NodeId::from_index(e.source()),
                target: id,
                rel,
            })
            .collect();
        edges.reverse();
        edges
    }

    pub fn targets(&self, id: NodeId, rel: RelType) -> Vec<NodeId> {
        self.outgoing(id, rel).into_iter().map(|e| e.target).collect()
    }

    pub fn sources(&self, id: NodeId, rel: RelType) -> Vec<NodeId> {
        self.incoming(id, rel).into_iter().map(|e| e.source).collect()
    }

    /// Snapshot of every relation of one kind. Repair loops requery this
    /// after each fix instead of iterating a live view.
    pub fn edges(&self, rel: RelType) -> Vec<Edge> {
        self.graph
            .node_indices()
            .flat_map(|idx| self.graph.edges_directed(idx, Outgoing))
            .filter(|e| *e.weight() == rel)
            .map(|e| Edge {
                source: NodeId::from_index(e.source()),
                target: NodeId::from_index(e.target()),
                rel,
            })
            .collect()
    }

    // ── Taxonomy shorthands ────────────────────────────────────────

    /// The direct parent, if any. Multiple parents can exist before the
    /// repair passes run; this returns the first.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.incoming(id, RelType::ParentOf)
            .first()
            .map(|e| e.source)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.targets(id, RelType::ParentOf)
    }

    /// Accepted usages of a synonym node.
    pub fn accepted_of(&self, id: NodeId) -> Vec<NodeId> {
        self.targets(id, RelType::SynonymOf)
    }

    /// Synonym usages pointing at an accepted node.
    pub fn synonyms_of(&self, id: NodeId) -> Vec<NodeId> {
        self.sources(id, RelType::SynonymOf)
    }

    /// The chain of parents above a node, nearest first. Parent cycles
    /// terminate the walk instead of looping.
    pub fn parents_above(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The top of the parent chain, or the node itself when detached.
    pub fn highest_parent(&self, id: NodeId) -> NodeId {
        self.parents_above(id).last().copied().unwrap_or(id)
    }

    /// Walk up the parent chain looking for an ancestor of the given rank.
    pub fn ancestor_at_rank(&self, id: NodeId, rank: Rank) -> Option<NodeId> {
        self.parents_above(id)
            .into_iter()
            .find(|anc| self.card(*anc).map(|c| c.rank).is_ok_and(|r| r == rank))
    }
}
