//! Core vocabulary of the engine: origins, name types, statuses, issues,
//! diagnostics, verbatim records and the composite usage payload.
//!
//! Every kind enum here follows the same shape: `as_str()` returning the
//! stable wire name, `Display` delegating to it, serde derives for the
//! payload store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clade_graph::{NodeId, Rank};

use crate::name::Name;
use crate::terms::Term;

/// Declare an i64 newtype id with `Display` and conversions to and from
/// the raw storage value.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

typed_id! {
    /// Key of one verbatim source record, assigned in reading order.
    VerbatimKey
}

// ── Origins ────────────────────────────────────────────────────────

/// How a name or usage came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    /// Read from a source record.
    Source,
    /// Synthesized while applying a denormalized classification.
    DenormedClassification,
    /// Materialized from a verbatim parent name that had no record of its own.
    VerbatimParent,
    /// Materialized from a verbatim accepted name that had no record of its own.
    VerbatimAccepted,
    /// Materialized from a verbatim original name that had no record of its own.
    VerbatimBasionym,
    /// Placeholder accepted taxon for a synonym whose accepted is unresolvable.
    MissingAccepted,
    Other,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "SOURCE",
            Self::DenormedClassification => "DENORMED_CLASSIFICATION",
            Self::VerbatimParent => "VERBATIM_PARENT",
            Self::VerbatimAccepted => "VERBATIM_ACCEPTED",
            Self::VerbatimBasionym => "VERBATIM_BASIONYM",
            Self::MissingAccepted => "MISSING_ACCEPTED",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Name types ─────────────────────────────────────────────────────

/// Coarse classification of a scientific name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameType {
    Scientific,
    Virus,
    HybridFormula,
    Informal,
    Placeholder,
    /// Parsed to nothing usable.
    NoName,
}

impl NameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scientific => "SCIENTIFIC",
            Self::Virus => "VIRUS",
            Self::HybridFormula => "HYBRID_FORMULA",
            Self::Informal => "INFORMAL",
            Self::Placeholder => "PLACEHOLDER",
            Self::NoName => "NO_NAME",
        }
    }

    /// Only parsable name types carry trustworthy epithets.
    pub fn is_parsable(&self) -> bool {
        matches!(self, Self::Scientific | Self::Informal)
    }
}

impl std::fmt::Display for NameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Taxonomic status ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxonomicStatus {
    Accepted,
    Doubtful,
    Synonym,
    AmbiguousSynonym,
    Misapplied,
}

impl TaxonomicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Doubtful => "DOUBTFUL",
            Self::Synonym => "SYNONYM",
            Self::AmbiguousSynonym => "AMBIGUOUS_SYNONYM",
            Self::Misapplied => "MISAPPLIED",
        }
    }

    pub fn is_synonym(&self) -> bool {
        matches!(self, Self::Synonym | Self::AmbiguousSynonym | Self::Misapplied)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::Doubtful)
    }

    /// Lenient parse of source status strings.
    pub fn parse(value: &str) -> Option<TaxonomicStatus> {
        let v = value.trim().to_ascii_lowercase();
        if v.is_empty() {
            return None;
        }
        if v.contains("misapplied") {
            return Some(Self::Misapplied);
        }
        if v.contains("ambiguous") {
            return Some(Self::AmbiguousSynonym);
        }
        if v.contains("synonym") {
            return Some(Self::Synonym);
        }
        match v.as_str() {
            "accepted" | "valid" => Some(Self::Accepted),
            "doubtful" | "dubious" | "provisionally accepted" | "provisional" => {
                Some(Self::Doubtful)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for TaxonomicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Nomenclatural code and status ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NomCode {
    Botanical,
    Zoological,
    Bacterial,
    Virus,
}

impl NomCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Botanical => "BOTANICAL",
            Self::Zoological => "ZOOLOGICAL",
            Self::Bacterial => "BACTERIAL",
            Self::Virus => "VIRUS",
        }
    }

    pub fn parse(value: &str) -> Option<NomCode> {
        match value.trim().to_ascii_lowercase().as_str() {
            "icn" | "icbn" | "icnafp" | "botanical" => Some(Self::Botanical),
            "iczn" | "zoological" => Some(Self::Zoological),
            "icnp" | "icnb" | "bacterial" | "prokaryotic" => Some(Self::Bacterial),
            "icvcn" | "virus" | "viral" => Some(Self::Virus),
            _ => None,
        }
    }
}

impl std::fmt::Display for NomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NomStatus {
    Legitimate,
    Illegitimate,
    Superfluous,
    Rejected,
    Conserved,
    Doubtful,
}

impl NomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legitimate => "LEGITIMATE",
            Self::Illegitimate => "ILLEGITIMATE",
            Self::Superfluous => "SUPERFLUOUS",
            Self::Rejected => "REJECTED",
            Self::Conserved => "CONSERVED",
            Self::Doubtful => "DOUBTFUL",
        }
    }

    pub fn parse(value: &str) -> Option<NomStatus> {
        let v = value.trim().trim_end_matches('.').to_ascii_lowercase();
        if v.is_empty() {
            return None;
        }
        let status = match v.as_str() {
            "legitimate" | "valid" | "nom. val" | "nomen validum" => Self::Legitimate,
            "illegitimate" | "nom. illeg" | "nomen illegitimum" => Self::Illegitimate,
            "superfluous" | "nom. superfl" | "nomen superfluum" => Self::Superfluous,
            "rejected" | "nom. rej" | "nomen rejiciendum" => Self::Rejected,
            "conserved" | "nom. cons" | "nomen conservandum" => Self::Conserved,
            "doubtful" | "nom. dub" | "nomen dubium" => Self::Doubtful,
            _ => return None,
        };
        Some(status)
    }
}

impl std::fmt::Display for NomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Issues ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which entity an issue talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueGroup {
    Name,
    Usage,
    Classification,
}

impl IssueGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Usage => "USAGE",
            Self::Classification => "CLASSIFICATION",
        }
    }
}

impl std::fmt::Display for IssueGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed enumeration of data-quality findings. Issues accumulate on a
/// usage and are persisted with it, never thrown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issue {
    // Interpretation
    RankInvalid,
    InconsistentAuthorship,
    UnparsableAuthorship,
    ParsedNameDiffers,
    NomenclaturalStatusInvalid,
    NomenclaturalCodeInvalid,
    InconsistentName,
    UnusualNameCharacters,
    // Insertion
    IdNotUnique,
    NameNotUnique,
    AcceptedNameMissing,
    AcceptedIdInvalid,
    ParentIdInvalid,
    BasionymIdInvalid,
    // Graph repair
    ChainedSynonym,
    ParentCycle,
    ChainedBasionym,
    TaxonomicStatusDoubtful,
    DerivedTaxonomicStatus,
    ClassificationNotApplied,
    // Verification
    EscapedCharacters,
    VernacularNameInvalid,
    DistributionInvalid,
}

impl Issue {
    pub const ALL: [Issue; 23] = [
        Self::RankInvalid,
        Self::InconsistentAuthorship,
        Self::UnparsableAuthorship,
        Self::ParsedNameDiffers,
        Self::NomenclaturalStatusInvalid,
        Self::NomenclaturalCodeInvalid,
        Self::InconsistentName,
        Self::UnusualNameCharacters,
        Self::IdNotUnique,
        Self::NameNotUnique,
        Self::AcceptedNameMissing,
        Self::AcceptedIdInvalid,
        Self::ParentIdInvalid,
        Self::BasionymIdInvalid,
        Self::ChainedSynonym,
        Self::ParentCycle,
        Self::ChainedBasionym,
        Self::TaxonomicStatusDoubtful,
        Self::DerivedTaxonomicStatus,
        Self::ClassificationNotApplied,
        Self::EscapedCharacters,
        Self::VernacularNameInvalid,
        Self::DistributionInvalid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankInvalid => "RANK_INVALID",
            Self::InconsistentAuthorship => "INCONSISTENT_AUTHORSHIP",
            Self::UnparsableAuthorship => "UNPARSABLE_AUTHORSHIP",
            Self::ParsedNameDiffers => "PARSED_NAME_DIFFERS",
            Self::NomenclaturalStatusInvalid => "NOMENCLATURAL_STATUS_INVALID",
            Self::NomenclaturalCodeInvalid => "NOMENCLATURAL_CODE_INVALID",
            Self::InconsistentName => "INCONSISTENT_NAME",
            Self::UnusualNameCharacters => "UNUSUAL_NAME_CHARACTERS",
            Self::IdNotUnique => "ID_NOT_UNIQUE",
            Self::NameNotUnique => "NAME_NOT_UNIQUE",
            Self::AcceptedNameMissing => "ACCEPTED_NAME_MISSING",
            Self::AcceptedIdInvalid => "ACCEPTED_ID_INVALID",
            Self::ParentIdInvalid => "PARENT_ID_INVALID",
            Self::BasionymIdInvalid => "BASIONYM_ID_INVALID",
            Self::ChainedSynonym => "CHAINED_SYNONYM",
            Self::ParentCycle => "PARENT_CYCLE",
            Self::ChainedBasionym => "CHAINED_BASIONYM",
            Self::TaxonomicStatusDoubtful => "TAXONOMIC_STATUS_DOUBTFUL",
            Self::DerivedTaxonomicStatus => "DERIVED_TAXONOMIC_STATUS",
            Self::ClassificationNotApplied => "CLASSIFICATION_NOT_APPLIED",
            Self::EscapedCharacters => "ESCAPED_CHARACTERS",
            Self::VernacularNameInvalid => "VERNACULAR_NAME_INVALID",
            Self::DistributionInvalid => "DISTRIBUTION_INVALID",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::InconsistentName
            | Self::IdNotUnique
            | Self::AcceptedNameMissing
            | Self::AcceptedIdInvalid
            | Self::ParentIdInvalid
            | Self::BasionymIdInvalid
            | Self::ParentCycle => Severity::Error,
            Self::RankInvalid
            | Self::InconsistentAuthorship
            | Self::UnparsableAuthorship
            | Self::UnusualNameCharacters
            | Self::NameNotUnique
            | Self::ChainedSynonym
            | Self::ChainedBasionym
            | Self::TaxonomicStatusDoubtful
            | Self::ClassificationNotApplied
            | Self::VernacularNameInvalid
            | Self::DistributionInvalid => Severity::Warning,
            Self::ParsedNameDiffers
            | Self::NomenclaturalStatusInvalid
            | Self::NomenclaturalCodeInvalid
            | Self::DerivedTaxonomicStatus
            | Self::EscapedCharacters => Severity::Info,
        }
    }

    pub fn group(&self) -> IssueGroup {
        match self {
            Self::RankInvalid
            | Self::InconsistentAuthorship
            | Self::UnparsableAuthorship
            | Self::ParsedNameDiffers
            | Self::NomenclaturalStatusInvalid
            | Self::NomenclaturalCodeInvalid
            | Self::InconsistentName
            | Self::UnusualNameCharacters => IssueGroup::Name,
            Self::IdNotUnique
            | Self::NameNotUnique
            | Self::AcceptedNameMissing
            | Self::AcceptedIdInvalid
            | Self::BasionymIdInvalid
            | Self::ChainedSynonym
            | Self::ParentCycle
            | Self::ChainedBasionym
            | Self::TaxonomicStatusDoubtful
            | Self::DerivedTaxonomicStatus
            | Self::EscapedCharacters
            | Self::VernacularNameInvalid
            | Self::DistributionInvalid => IssueGroup::Usage,
            Self::ParentIdInvalid | Self::ClassificationNotApplied => IssueGroup::Classification,
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Diagnostics ────────────────────────────────────────────────────

/// Issues and remarks gathered while working on one entity.
///
/// Threaded as an explicit value and merged into the owning usage, never
/// written through a shared sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub issues: BTreeSet<Issue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remarks: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&mut self, issue: Issue) {
        self.issues.insert(issue);
    }

    pub fn remark(&mut self, remark: impl Into<String>) {
        self.remarks.push(remark.into());
    }

    pub fn has(&self, issue: Issue) -> bool {
        self.issues.contains(&issue)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.remarks.is_empty()
    }

    /// Union the other diagnostics into this one.
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
        self.remarks.extend(other.remarks);
    }
}

// ── Verbatim records ───────────────────────────────────────────────

/// One source record exactly as read: term-keyed core values plus any
/// attached extension rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbatimRecord {
    pub key: Option<VerbatimKey>,
    pub terms: BTreeMap<Term, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vernacular_rows: Vec<BTreeMap<Term, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution_rows: Vec<BTreeMap<Term, String>>,
    /// True when the reader replaced escape sequences in any value.
    #[serde(default)]
    pub unescaped: bool,
}

impl VerbatimRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value of a term; empty strings count as absent.
    pub fn value(&self, term: Term) -> Option<&str> {
        self.terms
            .get(&term)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, term: Term) -> bool {
        self.value(term).is_some()
    }

    pub fn set(&mut self, term: Term, value: impl Into<String>) {
        self.terms.insert(term, value.into());
    }
}

// ── Usage payload parts ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VernacularName {
    pub name: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Area standard the area value belongs to.
    pub gazetteer: Option<String>,
    pub area: Option<String>,
    pub status: Option<String>,
}

/// Denormalized higher classification as rank-keyed name strings,
/// kingdom down to subgenus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub superfamily: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub subgenus: Option<String>,
}

impl Classification {
    pub fn by_rank(&self, rank: Rank) -> Option<&str> {
        let slot = match rank {
            Rank::Kingdom => &self.kingdom,
            Rank::Phylum => &self.phylum,
            Rank::Class => &self.class,
            Rank::Order => &self.order,
            Rank::Superfamily => &self.superfamily,
            Rank::Family => &self.family,
            Rank::Genus => &self.genus,
            Rank::Subgenus => &self.subgenus,
            _ => return None,
        };
        slot.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Set a rank's name; ranks outside the classification sequence are
    /// ignored.
    pub fn set_by_rank(&mut self, rank: Rank, value: Option<String>) {
        let slot = match rank {
            Rank::Kingdom => &mut self.kingdom,
            Rank::Phylum => &mut self.phylum,
            Rank::Class => &mut self.class,
            Rank::Order => &mut self.order,
            Rank::Superfamily => &mut self.superfamily,
            Rank::Family => &mut self.family,
            Rank::Genus => &mut self.genus,
            Rank::Subgenus => &mut self.subgenus,
            _ => return,
        };
        *slot = value;
    }

    /// The lowest classification rank that carries a name.
    pub fn lowest_rank(&self) -> Option<Rank> {
        Rank::CLASSIFICATION
            .into_iter()
            .rev()
            .find(|rank| self.by_rank(*rank).is_some())
    }

    pub fn is_empty(&self) -> bool {
        Rank::CLASSIFICATION
            .into_iter()
            .all(|rank| self.by_rank(rank).is_none())
    }

    /// Compare the names on all ranks strictly above `rank`.
    pub fn equals_above_rank(&self, other: &Classification, rank: Rank) -> bool {
        Rank::CLASSIFICATION
            .into_iter()
            .take_while(|r| r.higher_than(rank))
            .all(|r| self.by_rank(r) == other.by_rank(r))
    }
}

// ── The composite usage ────────────────────────────────────────────

/// One taxon or synonym record: a name bound to status, origin, relations
/// and attached extension data. The graph owns its relations; resolved
/// references are overlaid here by the final storage sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameUsage {
    pub name: Name,
    pub status: Option<TaxonomicStatus>,
    pub origin: Option<Origin>,
    /// Identifier carried by the source record, or synthesized during
    /// verification for usages the engine created.
    pub taxon_id: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
    pub according_to: Option<String>,
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vernacular_names: Vec<VernacularName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distributions: Vec<Distribution>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
    // Resolved references, written by the storage sync.
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_ids: Vec<NodeId>,
    pub basionym_id: Option<NodeId>,
}

impl NameUsage {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            status: None,
            origin: None,
            taxon_id: None,
            verbatim_key: None,
            according_to: None,
            classification: None,
            vernacular_names: Vec::new(),
            distributions: Vec::new(),
            diagnostics: Diagnostics::new(),
            parent_id: None,
            accepted_ids: Vec::new(),
            basionym_id: None,
        }
    }

    pub fn is_synonym(&self) -> bool {
        self.status.is_some_and(|s| s.is_synonym())
    }
}

// ── Insertion metadata ─────────────────────────────────────────────

/// Which cross-reference terms the source maps. Gates the optional
/// relation and classification work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFlags {
    pub parent_name_mapped: bool,
    pub accepted_name_mapped: bool,
    pub original_name_mapped: bool,
    pub denormed_classification_mapped: bool,
}

/// Counters and provenance of one insertion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionMetadata {
    pub run_id: Uuid,
    pub started: DateTime<Utc>,
    pub finished: Option<DateTime<Utc>>,
    pub records: u64,
    pub usages: u64,
    pub vernaculars: u64,
    pub distributions: u64,
    pub duplicate_ids: u64,
    pub ranks: BTreeMap<Rank, u64>,
    pub mappings: MappingFlags,
}

impl InsertionMetadata {
    pub fn new(mappings: MappingFlags) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started: Utc::now(),
            finished: None,
            records: 0,
            usages: 0,
            vernaculars: 0,
            distributions: 0,
            duplicate_ids: 0,
            ranks: BTreeMap::new(),
            mappings,
        }
    }

    pub fn count_rank(&mut self, rank: Rank) {
        *self.ranks.entry(rank).or_insert(0) += 1;
    }

    pub fn finish(&mut self) {
        self.finished = Some(Utc::now());
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished.unwrap_or_else(Utc::now) - self.started
    }
}
