//! Taxonomic rank vocabulary.
//!
//! Ranks are declared from kingdom down to subform; the derived ordering
//! follows that sequence. Hierarchy comparisons should go through
//! `higher_than`/`lower_than`: `Unranked` and `Other` are uncomparable
//! there and are excluded from the rank-category predicates.

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Genus,
    Subgenus,
    Section,
    Series,
    Species,
    Subspecies,
    Variety,
    Subvariety,
    Form,
    Subform,
    Unranked,
    Other,
}

impl Rank {
    /// The fixed rank sequence a denormalized classification may carry,
    /// highest first.
    pub const CLASSIFICATION: [Rank; 8] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Superfamily,
        Rank::Family,
        Rank::Genus,
        Rank::Subgenus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Superfamily => "superfamily",
            Self::Family => "family",
            Self::Subfamily => "subfamily",
            Self::Tribe => "tribe",
            Self::Genus => "genus",
            Self::Subgenus => "subgenus",
            Self::Section => "section",
            Self::Series => "series",
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Variety => "variety",
            Self::Subvariety => "subvariety",
            Self::Form => "form",
            Self::Subform => "subform",
            Self::Unranked => "unranked",
            Self::Other => "other",
        }
    }

    /// Parse a rank from a term value: full rank names plus the common
    /// botanical/zoological marker abbreviations.
    pub fn parse(value: &str) -> Option<Rank> {
        let v = value.trim().trim_end_matches('.').to_ascii_lowercase();
        if v.is_empty() {
            return None;
        }
        let rank = match v.as_str() {
            "kingdom" | "regnum" => Self::Kingdom,
            "phylum" | "division" | "divisio" => Self::Phylum,
            "class" | "classis" => Self::Class,
            "order" | "ordo" => Self::Order,
            "superfamily" | "superfamilia" => Self::Superfamily,
            "family" | "familia" | "fam" => Self::Family,
            "subfamily" | "subfamilia" | "subfam" => Self::Subfamily,
            "tribe" | "tribus" | "trib" => Self::Tribe,
            "genus" | "gen" => Self::Genus,
            "subgenus" | "subgen" | "subg" => Self::Subgenus,
            "section" | "sectio" | "sect" => Self::Section,
            "series" | "ser" => Self::Series,
            "species" | "sp" | "spec" => Self::Species,
            "subspecies" | "subsp" | "ssp" => Self::Subspecies,
            "variety" | "varietas" | "var" => Self::Variety,
            "subvariety" | "subvarietas" | "subvar" => Self::Subvariety,
            "form" | "forma" | "f" => Self::Form,
            "subform" | "subforma" | "subf" => Self::Subform,
            "unranked" => Self::Unranked,
            "other" => Self::Other,
            _ => return None,
        };
        Some(rank)
    }

    fn ordinal(self) -> u8 {
        match self {
            Self::Kingdom => 0,
            Self::Phylum => 1,
            Self::Class => 2,
            Self::Order => 3,
            Self::Superfamily => 4,
            Self::Family => 5,
            Self::Subfamily => 6,
            Self::Tribe => 7,
            Self::Genus => 8,
            Self::Subgenus => 9,
            Self::Section => 10,
            Self::Series => 11,
            Self::Species => 12,
            Self::Subspecies => 13,
            Self::Variety => 14,
            Self::Subvariety => 15,
            Self::Form => 16,
            Self::Subform => 17,
            Self::Unranked => 254,
            Self::Other => 255,
        }
    }

    /// `Unranked` and `Other` cannot be ordered against real ranks.
    pub fn is_uncomparable(self) -> bool {
        matches!(self, Self::Unranked | Self::Other)
    }

    pub fn not_other_or_unranked(self) -> bool {
        !self.is_uncomparable()
    }

    /// True when `self` sits strictly above `other` in the hierarchy.
    /// Uncomparable ranks never rank higher than anything.
    pub fn higher_than(self, other: Rank) -> bool {
        self.not_other_or_unranked()
            && other.not_other_or_unranked()
            && self.ordinal() < other.ordinal()
    }

    pub fn lower_than(self, other: Rank) -> bool {
        other.higher_than(self)
    }

    // ── Rank-category predicates (drive the name validator) ────────

    /// Genus or anything above it.
    pub fn is_genus_or_suprageneric(self) -> bool {
        self.not_other_or_unranked() && self.ordinal() <= Self::Genus.ordinal()
    }

    /// Strictly between genus and species: subgenus, section, series.
    pub fn is_infrageneric_supraspecific(self) -> bool {
        self.not_other_or_unranked()
            && self.ordinal() > Self::Genus.ordinal()
            && self.ordinal() < Self::Species.ordinal()
    }

    /// Species or anything below it.
    pub fn is_species_or_below(self) -> bool {
        self.not_other_or_unranked() && self.ordinal() >= Self::Species.ordinal()
    }

    /// Strictly below species.
    pub fn is_infraspecific(self) -> bool {
        self.not_other_or_unranked() && self.ordinal() > Self::Species.ordinal()
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RANKS: [Rank; 20] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Superfamily,
        Rank::Family,
        Rank::Subfamily,
        Rank::Tribe,
        Rank::Genus,
        Rank::Subgenus,
        Rank::Section,
        Rank::Series,
        Rank::Species,
        Rank::Subspecies,
        Rank::Variety,
        Rank::Subvariety,
        Rank::Form,
        Rank::Subform,
        Rank::Unranked,
        Rank::Other,
    ];

    #[test]
    fn ordering_follows_the_hierarchy() {
        assert!(Rank::Kingdom.higher_than(Rank::Species));
        assert!(Rank::Family.higher_than(Rank::Genus));
        assert!(Rank::Species.higher_than(Rank::Variety));
        assert!(!Rank::Species.higher_than(Rank::Species));
        assert!(Rank::Variety.lower_than(Rank::Species));
    }

    #[test]
    fn uncomparable_ranks_never_win() {
        assert!(!Rank::Unranked.higher_than(Rank::Species));
        assert!(!Rank::Species.higher_than(Rank::Unranked));
        assert!(!Rank::Other.higher_than(Rank::Other));
        assert!(Rank::Unranked.is_uncomparable());
        assert!(Rank::Genus.not_other_or_unranked());
    }

    #[test]
    fn category_predicates() {
        assert!(Rank::Family.is_genus_or_suprageneric());
        assert!(Rank::Genus.is_genus_or_suprageneric());
        assert!(!Rank::Subgenus.is_genus_or_suprageneric());

        assert!(Rank::Subgenus.is_infrageneric_supraspecific());
        assert!(Rank::Section.is_infrageneric_supraspecific());
        assert!(!Rank::Species.is_infrageneric_supraspecific());

        assert!(Rank::Species.is_species_or_below());
        assert!(Rank::Form.is_species_or_below());
        assert!(!Rank::Species.is_infraspecific());
        assert!(Rank::Subspecies.is_infraspecific());

        assert!(!Rank::Unranked.is_species_or_below());
        assert!(!Rank::Other.is_genus_or_suprageneric());
    }

    #[test]
    fn parse_names_and_markers() {
        assert_eq!(Rank::parse("species"), Some(Rank::Species));
        assert_eq!(Rank::parse("Species"), Some(Rank::Species));
        assert_eq!(Rank::parse("var."), Some(Rank::Variety));
        assert_eq!(Rank::parse("subsp."), Some(Rank::Subspecies));
        assert_eq!(Rank::parse("ssp"), Some(Rank::Subspecies));
        assert_eq!(Rank::parse("f."), Some(Rank::Form));
        assert_eq!(Rank::parse("familia"), Some(Rank::Family));
        assert_eq!(Rank::parse(""), None);
        assert_eq!(Rank::parse("superduperfamily"), None);
    }

    #[test]
    fn classification_sequence_is_descending() {
        for pair in Rank::CLASSIFICATION.windows(2) {
            assert!(
                pair[0].higher_than(pair[1]),
                "{} should be higher than {}",
                pair[0],
                pair[1]
            );
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_rank() -> impl Strategy<Value = Rank> {
            proptest::sample::select(ALL_RANKS.to_vec())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn serde_roundtrip(rank in arb_rank()) {
                let json = serde_json::to_string(&rank).unwrap();
                let back: Rank = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, rank);
            }

            #[test]
            fn parse_of_as_str_roundtrips(rank in arb_rank()) {
                prop_assert_eq!(Rank::parse(rank.as_str()), Some(rank));
            }

            #[test]
            fn higher_than_is_irreflexive_and_antisymmetric(a in arb_rank(), b in arb_rank()) {
                prop_assert!(!a.higher_than(a));
                if a.higher_than(b) {
                    prop_assert!(!b.higher_than(a));
                }
            }
        }
    }
}
