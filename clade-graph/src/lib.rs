pub mod graph;
pub mod rank;
pub mod traversal;

use serde::{Deserialize, Serialize};

pub use graph::{NodeCard, NodeId, TaxonGraph};
pub use rank::Rank;
pub use traversal::{BasionymChain, SynonymChain};

/// Error type for the graph substrate.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    MissingNode(NodeId),

    #[error("Corrupt topology: {0}")]
    CorruptTopology(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Relation kinds ─────────────────────────────────────────────────

/// Typed relation between two usage nodes.
///
/// `ParentOf` points from parent to child; `SynonymOf` from synonym to
/// accepted; `BasionymOf` from recombination to original name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelType {
    ParentOf,
    SynonymOf,
    BasionymOf,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParentOf => "PARENT_OF",
            Self::SynonymOf => "SYNONYM_OF",
            Self::BasionymOf => "BASIONYM_OF",
        }
    }
}

impl std::fmt::Display for RelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Label bitset ───────────────────────────────────────────────────

/// Non-exclusive node labels, packed into a bitset.
///
/// `ALL` is the empty set and acts as the unconstrained query label:
/// `labels.has(Labels::ALL)` is true for every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Labels(u8);

impl Labels {
    pub const ALL: Labels = Labels(0);
    pub const TAXON: Labels = Labels(1);
    pub const SYNONYM: Labels = Labels(1 << 1);
    pub const BASIONYM: Labels = Labels(1 << 2);
    pub const ROOT: Labels = Labels(1 << 3);

    pub fn has(self, other: Labels) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: Labels) {
        self.0 |= other.0;
    }

    pub fn unset(&mut self, other: Labels) {
        self.0 &= !other.0;
    }
}

impl std::fmt::Display for Labels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (bit, name) in [
            (Labels::TAXON, "TAXON"),
            (Labels::SYNONYM, "SYNONYM"),
            (Labels::BASIONYM, "BASIONYM"),
            (Labels::ROOT, "ROOT"),
        ] {
            if self.has(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("(none)")?;
        }
        Ok(())
    }
}

// ── Edge value ─────────────────────────────────────────────────────

/// An owned view of one relation, as returned by traversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub rel: RelType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_set_and_unset() {
        let mut labels = Labels::default();
        assert!(!labels.has(Labels::TAXON));

        labels.set(Labels::TAXON);
        labels.set(Labels::ROOT);
        assert!(labels.has(Labels::TAXON));
        assert!(labels.has(Labels::ROOT));
        assert!(!labels.has(Labels::SYNONYM));

        labels.unset(Labels::ROOT);
        assert!(!labels.has(Labels::ROOT));
        assert!(labels.has(Labels::TAXON));
    }

    #[test]
    fn all_label_matches_everything() {
        let empty = Labels::default();
        let mut synonym = Labels::default();
        synonym.set(Labels::SYNONYM);

        assert!(empty.has(Labels::ALL));
        assert!(synonym.has(Labels::ALL));
    }

    #[test]
    fn labels_display() {
        let mut labels = Labels::default();
        assert_eq!(labels.to_string(), "(none)");

        labels.set(Labels::TAXON);
        labels.set(Labels::ROOT);
        assert_eq!(labels.to_string(), "TAXON|ROOT");
    }

    #[test]
    fn rel_type_as_str_stable() {
        assert_eq!(RelType::ParentOf.as_str(), "PARENT_OF");
        assert_eq!(RelType::SynonymOf.to_string(), "SYNONYM_OF");
        assert_eq!(RelType::BasionymOf.as_str(), "BASIONYM_OF");
    }
}
