//! Source record terms.
//!
//! Verbatim records are keyed by this closed term vocabulary. `parse`
//! accepts full term URIs, bare names and the common aliases seen in
//! real checklist headers.

use serde::{Deserialize, Serialize};

use clade_graph::Rank;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Term {
    #[serde(rename = "taxonID")]
    TaxonId,
    ScientificName,
    ScientificNameAuthorship,
    TaxonRank,
    NomenclaturalCode,
    NomenclaturalStatus,
    TaxonomicStatus,
    #[serde(rename = "acceptedNameUsageID")]
    AcceptedNameUsageId,
    AcceptedNameUsage,
    #[serde(rename = "parentNameUsageID")]
    ParentNameUsageId,
    ParentNameUsage,
    #[serde(rename = "originalNameUsageID")]
    OriginalNameUsageId,
    OriginalNameUsage,
    NameAccordingTo,
    TaxonRemarks,
    References,
    Kingdom,
    Phylum,
    Class,
    Order,
    Superfamily,
    Family,
    Genus,
    Subgenus,
    SpecificEpithet,
    InfraspecificEpithet,
    VernacularName,
    Language,
    CountryCode,
    #[serde(rename = "locationID")]
    LocationId,
    Locality,
    OccurrenceStatus,
}

impl Term {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaxonId => "taxonID",
            Self::ScientificName => "scientificName",
            Self::ScientificNameAuthorship => "scientificNameAuthorship",
            Self::TaxonRank => "taxonRank",
            Self::NomenclaturalCode => "nomenclaturalCode",
            Self::NomenclaturalStatus => "nomenclaturalStatus",
            Self::TaxonomicStatus => "taxonomicStatus",
            Self::AcceptedNameUsageId => "acceptedNameUsageID",
            Self::AcceptedNameUsage => "acceptedNameUsage",
            Self::ParentNameUsageId => "parentNameUsageID",
            Self::ParentNameUsage => "parentNameUsage",
            Self::OriginalNameUsageId => "originalNameUsageID",
            Self::OriginalNameUsage => "originalNameUsage",
            Self::NameAccordingTo => "nameAccordingTo",
            Self::TaxonRemarks => "taxonRemarks",
            Self::References => "references",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Superfamily => "superfamily",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Subgenus => "subgenus",
            Self::SpecificEpithet => "specificEpithet",
            Self::InfraspecificEpithet => "infraspecificEpithet",
            Self::VernacularName => "vernacularName",
            Self::Language => "language",
            Self::CountryCode => "countryCode",
            Self::LocationId => "locationID",
            Self::Locality => "locality",
            Self::OccurrenceStatus => "occurrenceStatus",
        }
    }

    /// Parse a column header into a term. Namespaced URIs are reduced to
    /// their local name first; matching is case-insensitive.
    pub fn parse(header: &str) -> Option<Term> {
        let local = header
            .rsplit(['/', '#', ':'])
            .next()
            .unwrap_or(header)
            .trim();
        let term = match local.to_ascii_lowercase().as_str() {
            "taxonid" | "id" | "coreid" => Self::TaxonId,
            "scientificname" => Self::ScientificName,
            "scientificnameauthorship" | "authorship" => Self::ScientificNameAuthorship,
            "taxonrank" | "rank" | "verbatimtaxonrank" => Self::TaxonRank,
            "nomenclaturalcode" => Self::NomenclaturalCode,
            "nomenclaturalstatus" => Self::NomenclaturalStatus,
            "taxonomicstatus" | "status" => Self::TaxonomicStatus,
            "acceptednameusageid" | "acceptedtaxonid" => Self::AcceptedNameUsageId,
            "acceptednameusage" => Self::AcceptedNameUsage,
            "parentnameusageid" | "parenttaxonid" | "highertaxonid" => Self::ParentNameUsageId,
            "parentnameusage" | "highertaxon" => Self::ParentNameUsage,
            "originalnameusageid" | "basionymid" => Self::OriginalNameUsageId,
            "originalnameusage" | "basionym" => Self::OriginalNameUsage,
            "nameaccordingto" | "accordingto" | "sensu" => Self::NameAccordingTo,
            "taxonremarks" | "remarks" => Self::TaxonRemarks,
            "references" => Self::References,
            "kingdom" => Self::Kingdom,
            "phylum" => Self::Phylum,
            "class" => Self::Class,
            "order" => Self::Order,
            "superfamily" => Self::Superfamily,
            "family" => Self::Family,
            "genus" => Self::Genus,
            "subgenus" => Self::Subgenus,
            "specificepithet" => Self::SpecificEpithet,
            "infraspecificepithet" => Self::InfraspecificEpithet,
            "vernacularname" => Self::VernacularName,
            "language" => Self::Language,
            "countrycode" | "country" => Self::CountryCode,
            "locationid" => Self::LocationId,
            "locality" => Self::Locality,
            "occurrencestatus" => Self::OccurrenceStatus,
            _ => return None,
        };
        Some(term)
    }

    /// Term carrying the classification name for one of the fixed
    /// classification ranks.
    pub fn for_classification_rank(rank: Rank) -> Option<Term> {
        match rank {
            Rank::Kingdom => Some(Self::Kingdom),
            Rank::Phylum => Some(Self::Phylum),
            Rank::Class => Some(Self::Class),
            Rank::Order => Some(Self::Order),
            Rank::Superfamily => Some(Self::Superfamily),
            Rank::Family => Some(Self::Family),
            Rank::Genus => Some(Self::Genus),
            Rank::Subgenus => Some(Self::Subgenus),
            _ => None,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
