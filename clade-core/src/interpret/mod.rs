//! Record interpretation: one verbatim record in, one usage out.
//!
//! The name is settled first — rank term, free-text name or atomized
//! columns, separately mapped authorship — then the usage around it:
//! status, classification columns and the extension rows. Findings go on
//! the record's [`Diagnostics`]; interpretation itself never fails, it
//! returns `None` only when a record carries no name material at all.

mod parser;

pub use parser::{BasicParser, NameParser, ParsedAuthorship};

use tracing::debug;

use clade_graph::Rank;

use crate::name::{Authorship, Name};
use crate::terms::Term;
use crate::types::{
    Classification, Diagnostics, Distribution, Issue, NameUsage, NomCode, NomStatus, Origin,
    TaxonomicStatus, VerbatimRecord, VernacularName,
};

/// Turns verbatim records into interpreted usages.
pub struct Interpreter<'a> {
    parser: &'a dyn NameParser,
    /// Dataset-wide default applied when a record names no code.
    default_code: Option<NomCode>,
}

impl<'a> Interpreter<'a> {
    pub fn new(parser: &'a dyn NameParser, default_code: Option<NomCode>) -> Self {
        Self {
            parser,
            default_code,
        }
    }

    /// Interpret one record. `None` means the record carries no name
    /// material and is skipped.
    pub fn interpret(&self, record: &VerbatimRecord) -> Option<NameUsage> {
        let mut diagnostics = Diagnostics::new();
        let name = self.interpret_name(record, &mut diagnostics)?;

        let mut usage = NameUsage::new(name);
        usage.verbatim_key = record.key;
        usage.taxon_id = record.value(Term::TaxonId).map(str::to_string);
        usage.origin = Some(Origin::Source);
        usage.status = Some(interpret_status(record, &mut diagnostics));
        usage.according_to = record.value(Term::NameAccordingTo).map(str::to_string);
        if let Some(remarks) = record.value(Term::TaxonRemarks) {
            diagnostics.remark(remarks);
        }

        let mut classification = Classification::default();
        for rank in Rank::CLASSIFICATION {
            if let Some(term) = Term::for_classification_rank(rank) {
                if let Some(value) = record.value(term) {
                    classification.set_by_rank(rank, Some(value.to_string()));
                }
            }
        }
        if !classification.is_empty() {
            usage.classification = Some(classification);
        }

        for row in &record.vernacular_rows {
            match row_value(row, Term::VernacularName) {
                Some(vernacular) => usage.vernacular_names.push(VernacularName {
                    name: Some(vernacular.to_string()),
                    language: row_value(row, Term::Language).map(str::to_string),
                    country: row_value(row, Term::CountryCode).map(str::to_string),
                }),
                None => diagnostics.flag(Issue::VernacularNameInvalid),
            }
        }
        for row in &record.distribution_rows {
            match interpret_area(row) {
                Some((gazetteer, area)) => usage.distributions.push(Distribution {
                    gazetteer: Some(gazetteer),
                    area: Some(area),
                    status: row_value(row, Term::OccurrenceStatus).map(str::to_string),
                }),
                None => diagnostics.flag(Issue::DistributionInvalid),
            }
        }

        usage.diagnostics = diagnostics;
        Some(usage)
    }

    fn interpret_name(
        &self,
        record: &VerbatimRecord,
        diagnostics: &mut Diagnostics,
    ) -> Option<Name> {
        // The rank term is settled first so it can steer the parser.
        let given_rank = match record.value(Term::TaxonRank) {
            None => None,
            Some(value) => match Rank::parse(value) {
                Some(rank) => Some(rank),
                None => {
                    diagnostics.flag(Issue::RankInvalid);
                    Some(Rank::Unranked)
                }
            },
        };

        let authorship_raw = record.value(Term::ScientificNameAuthorship);
        let mut name = if let Some(scientific) = record.value(Term::ScientificName) {
            let mut name = self.parser.parse(scientific, given_rank);
            if let Some(raw) = authorship_raw {
                self.merge_authorship(&mut name, raw, diagnostics);
            }
            name
        } else if let Some(name) = self.assemble_atoms(record, given_rank, diagnostics) {
            name
        } else {
            return None;
        };

        name.origin = Some(Origin::Source);
        name.link = record.value(Term::References).map(str::to_string);
        name.nom_status = record.value(Term::NomenclaturalStatus).and_then(|value| {
            let status = NomStatus::parse(value);
            if status.is_none() {
                diagnostics.flag(Issue::NomenclaturalStatusInvalid);
            }
            status
        });
        // The dataset default fills in before the name string is rebuilt.
        name.code = match record.value(Term::NomenclaturalCode) {
            None => self.default_code,
            Some(value) => NomCode::parse(value).or_else(|| {
                diagnostics.flag(Issue::NomenclaturalCodeInvalid);
                self.default_code
            }),
        };

        // The rank term wins unless it was absent or uncomparable and the
        // parser recovered a real one.
        let given_or_unranked = given_rank.unwrap_or(Rank::Unranked);
        if given_or_unranked.not_other_or_unranked() || name.rank.is_none() {
            name.rank = Some(given_or_unranked);
        }

        if !name.rebuild_scientific_name() {
            debug!(?name, "no scientific name could be rebuilt");
            diagnostics.flag(Issue::InconsistentName);
        }
        Some(name)
    }

    /// Merge a separately mapped authorship column into a parsed name.
    fn merge_authorship(&self, name: &mut Name, raw: &str, diagnostics: &mut Diagnostics) {
        let parsed = self.parser.parse_authorship(raw).unwrap_or_else(|| {
            debug!(authorship = raw, "unparsable authorship kept verbatim");
            diagnostics.flag(Issue::UnparsableAuthorship);
            ParsedAuthorship {
                combination: Authorship {
                    authors: vec![raw.to_string()],
                    ..Authorship::default()
                },
                ..ParsedAuthorship::default()
            }
        });
        if name.authorship.contradicts(&parsed.combination) {
            diagnostics.flag(Issue::InconsistentAuthorship);
        }
        name.authorship = parsed.combination;
        if !parsed.basionym.is_empty() {
            name.basionym_authorship = parsed.basionym;
        }
    }

    /// Reconstruct a name from atomized columns, cross-checking the parse.
    fn assemble_atoms(
        &self,
        record: &VerbatimRecord,
        given_rank: Option<Rank>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Name> {
        let genus = record.value(Term::Genus)?;
        let mut atoms = Name::default();
        atoms.genus = Some(genus.to_string());
        atoms.infrageneric_epithet = record.value(Term::Subgenus).map(str::to_string);
        atoms.specific_epithet = record.value(Term::SpecificEpithet).map(str::to_string);
        atoms.infraspecific_epithet = record.value(Term::InfraspecificEpithet).map(str::to_string);
        atoms.rank = given_rank;

        let canonical = atoms.canonical_name()?;
        let full = match record.value(Term::ScientificNameAuthorship) {
            Some(authorship) => format!("{canonical} {authorship}"),
            None => canonical,
        };
        let name = self.parser.parse(&full, given_rank);
        if name.is_parsed() && atoms_differ(&atoms, &name) {
            debug!(reconstructed = full, "parsed name differs from its atoms");
            diagnostics.flag(Issue::ParsedNameDiffers);
        }
        Some(name)
    }
}

/// Uninomial results count as a genus match for atom comparison.
fn atoms_differ(atoms: &Name, parsed: &Name) -> bool {
    let genus_matches = parsed.genus == atoms.genus
        || (parsed.genus.is_none() && parsed.uninomial == atoms.genus);
    !genus_matches
        || parsed.specific_epithet != atoms.specific_epithet
        || parsed.infraspecific_epithet != atoms.infraspecific_epithet
}

/// Declared status, or one derived from the presence of an accepted-name
/// reference.
fn interpret_status(record: &VerbatimRecord, diagnostics: &mut Diagnostics) -> TaxonomicStatus {
    let fallback = if record.has(Term::AcceptedNameUsageId) || record.has(Term::AcceptedNameUsage)
    {
        TaxonomicStatus::Synonym
    } else {
        TaxonomicStatus::Accepted
    };
    match record.value(Term::TaxonomicStatus) {
        None => fallback,
        Some(value) => TaxonomicStatus::parse(value).unwrap_or_else(|| {
            diagnostics.flag(Issue::TaxonomicStatusDoubtful);
            diagnostics.remark(format!("Unknown taxonomic status: {value}"));
            fallback
        }),
    }
}

fn row_value(row: &std::collections::BTreeMap<Term, String>, term: Term) -> Option<&str> {
    row.get(&term).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Area plus the standard it belongs to. A prefixed location id names its
/// own standard; plain text falls back to TEXT.
fn interpret_area(row: &std::collections::BTreeMap<Term, String>) -> Option<(String, String)> {
    if let Some(location) = row_value(row, Term::LocationId) {
        return match location.split_once(':') {
            Some((prefix, area)) if !prefix.is_empty() && !area.trim().is_empty() => {
                Some((prefix.to_uppercase(), area.trim().to_string()))
            }
            _ => Some(("TEXT".to_string(), location.to_string())),
        };
    }
    row_value(row, Term::Locality).map(|locality| ("TEXT".to_string(), locality.to_string()))
}
