//! The parsed scientific name and its canonical rendering.

use serde::{Deserialize, Serialize};

use clade_graph::{NodeId, Rank};

use crate::types::{NameType, NomCode, NomStatus, Origin};

/// Authorship of one combination: authors, ex-authors and year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorship {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ex_authors: Vec<String>,
    pub year: Option<String>,
}

impl Authorship {
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty() && self.ex_authors.is_empty() && self.year.is_none()
    }

    /// True when both carry authors and they disagree.
    pub fn contradicts(&self, other: &Authorship) -> bool {
        !self.authors.is_empty() && !other.authors.is_empty() && self.authors != other.authors
    }
}

fn join_authors(authors: &[String]) -> String {
    match authors.len() {
        0 => String::new(),
        1 => authors[0].clone(),
        n => format!("{} & {}", authors[..n - 1].join(", "), authors[n - 1]),
    }
}

impl std::fmt::Display for Authorship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        if !self.ex_authors.is_empty() {
            out.push_str(&join_authors(&self.ex_authors));
            out.push_str(" ex ");
        }
        out.push_str(&join_authors(&self.authors));
        if let Some(year) = &self.year {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(year);
        }
        f.write_str(&out)
    }
}

/// A scientific name: atomized epithets, authorship, rank and the
/// maintained full name string.
///
/// The full string is authoritative for unparsable name types (viruses,
/// hybrid formulas, placeholders); for parsable ones it is rebuilt from
/// the atoms after interpretation settles them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub scientific_name: Option<String>,
    pub uninomial: Option<String>,
    pub genus: Option<String>,
    pub infrageneric_epithet: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    #[serde(default, skip_serializing_if = "Authorship::is_empty")]
    pub authorship: Authorship,
    #[serde(default, skip_serializing_if = "Authorship::is_empty")]
    pub basionym_authorship: Authorship,
    pub rank: Option<Rank>,
    pub code: Option<NomCode>,
    pub nom_status: Option<NomStatus>,
    pub name_type: Option<NameType>,
    pub origin: Option<Origin>,
    /// Node id of the basionym heading this name's homotypic group.
    pub homotypic_key: Option<NodeId>,
    pub link: Option<String>,
}

fn infrageneric_marker(rank: Rank) -> Option<&'static str> {
    match rank {
        Rank::Subgenus => Some("subg."),
        Rank::Section => Some("sect."),
        Rank::Series => Some("ser."),
        _ => None,
    }
}

fn infraspecific_marker(rank: Rank) -> Option<&'static str> {
    match rank {
        Rank::Subspecies => Some("subsp."),
        Rank::Variety => Some("var."),
        Rank::Subvariety => Some("subvar."),
        Rank::Form => Some("f."),
        Rank::Subform => Some("subf."),
        _ => None,
    }
}

impl Name {
    /// True when any atomized part is present.
    pub fn is_parsed(&self) -> bool {
        self.uninomial.is_some()
            || self.genus.is_some()
            || self.infrageneric_epithet.is_some()
            || self.specific_epithet.is_some()
            || self.infraspecific_epithet.is_some()
    }

    pub fn is_parsable_type(&self) -> bool {
        self.name_type.is_none_or(|t| t.is_parsable())
    }

    /// Canonical name without authorship, assembled from the atoms.
    pub fn canonical_name(&self) -> Option<String> {
        if let Some(uninomial) = &self.uninomial {
            return Some(uninomial.clone());
        }
        let genus = self.genus.as_ref()?;
        let mut out = genus.clone();
        if let Some(infragen) = &self.infrageneric_epithet {
            if self.specific_epithet.is_none() {
                match self.rank.and_then(infrageneric_marker) {
                    Some(marker) => {
                        out.push(' ');
                        out.push_str(marker);
                        out.push(' ');
                        out.push_str(infragen);
                    }
                    None => {
                        out.push_str(" (");
                        out.push_str(infragen);
                        out.push(')');
                    }
                }
            }
        }
        if let Some(specific) = &self.specific_epithet {
            out.push(' ');
            out.push_str(specific);
            if let Some(infra) = &self.infraspecific_epithet {
                if let Some(marker) = self.rank.and_then(infraspecific_marker) {
                    out.push(' ');
                    out.push_str(marker);
                }
                out.push(' ');
                out.push_str(infra);
            }
        }
        Some(out)
    }

    /// Complete authorship: original combination in brackets, then the
    /// current one.
    pub fn full_authorship(&self) -> Option<String> {
        let mut out = String::new();
        if !self.basionym_authorship.is_empty() {
            out.push('(');
            out.push_str(&self.basionym_authorship.to_string());
            out.push(')');
        }
        if !self.authorship.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&self.authorship.to_string());
        }
        if out.is_empty() { None } else { Some(out) }
    }

    /// Rebuild the full scientific-name string from the settled atoms.
    ///
    /// Unparsable name types keep their string untouched. Returns false
    /// when nothing buildable exists, which callers record as an issue.
    pub fn rebuild_scientific_name(&mut self) -> bool {
        if !self.is_parsable_type() {
            return self.scientific_name.as_ref().is_some_and(|s| !s.is_empty());
        }
        let Some(canonical) = self.canonical_name() else {
            return false;
        };
        let full = match self.full_authorship() {
            Some(authorship) => format!("{canonical} {authorship}"),
            None => canonical,
        };
        self.scientific_name = Some(full);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_binomial_with_authorship() {
        let mut name = Name {
            genus: Some("Abies".into()),
            specific_epithet: Some("alba".into()),
            rank: Some(Rank::Species),
            authorship: Authorship {
                authors: vec!["Mill.".into()],
                ..Authorship::default()
            },
            name_type: Some(NameType::Scientific),
            ..Name::default()
        };

        assert!(name.rebuild_scientific_name());
        assert_eq!(name.scientific_name.as_deref(), Some("Abies alba Mill."));
        assert_eq!(name.canonical_name().as_deref(), Some("Abies alba"));
    }

    #[test]
    fn rebuild_trinomial_includes_rank_marker() {
        let mut name = Name {
            genus: Some("Poa".into()),
            specific_epithet: Some("pratensis".into()),
            infraspecific_epithet: Some("alpigena".into()),
            rank: Some(Rank::Subspecies),
            name_type: Some(NameType::Scientific),
            ..Name::default()
        };

        assert!(name.rebuild_scientific_name());
        assert_eq!(
            name.scientific_name.as_deref(),
            Some("Poa pratensis subsp. alpigena")
        );
    }

    #[test]
    fn rebuild_basionym_authorship_in_brackets() {
        let mut name = Name {
            genus: Some("Picea".into()),
            specific_epithet: Some("abies".into()),
            rank: Some(Rank::Species),
            authorship: Authorship {
                authors: vec!["H. Karst.".into()],
                ..Authorship::default()
            },
            basionym_authorship: Authorship {
                authors: vec!["L.".into()],
                ..Authorship::default()
            },
            name_type: Some(NameType::Scientific),
            ..Name::default()
        };

        assert!(name.rebuild_scientific_name());
        assert_eq!(
            name.scientific_name.as_deref(),
            Some("Picea abies (L.) H. Karst.")
        );
    }

    #[test]
    fn rebuild_subgenus_uses_marker_or_brackets() {
        let mut with_rank = Name {
            genus: Some("Pinus".into()),
            infrageneric_epithet: Some("Strobus".into()),
            rank: Some(Rank::Subgenus),
            name_type: Some(NameType::Scientific),
            ..Name::default()
        };
        assert!(with_rank.rebuild_scientific_name());
        assert_eq!(
            with_rank.scientific_name.as_deref(),
            Some("Pinus subg. Strobus")
        );

        let mut rankless = Name {
            genus: Some("Pinus".into()),
            infrageneric_epithet: Some("Strobus".into()),
            name_type: Some(NameType::Scientific),
            ..Name::default()
        };
        assert!(rankless.rebuild_scientific_name());
        assert_eq!(
            rankless.scientific_name.as_deref(),
            Some("Pinus (Strobus)")
        );
    }

    #[test]
    fn rebuild_without_atoms_fails() {
        let mut name = Name {
            name_type: Some(NameType::Scientific),
            ..Name::default()
        };
        assert!(!name.rebuild_scientific_name());
        assert_eq!(name.scientific_name, None);
    }

    #[test]
    fn virus_names_keep_their_raw_string() {
        let mut name = Name {
            scientific_name: Some("Tobacco mosaic virus".into()),
            name_type: Some(NameType::Virus),
            ..Name::default()
        };
        assert!(name.rebuild_scientific_name());
        assert_eq!(
            name.scientific_name.as_deref(),
            Some("Tobacco mosaic virus")
        );
    }

    #[test]
    fn authorship_display_joins_authors() {
        let authorship = Authorship {
            authors: vec!["Hook.".into(), "Arn.".into(), "Benth.".into()],
            ex_authors: vec!["Seem.".into()],
            year: Some("1854".into()),
        };
        assert_eq!(authorship.to_string(), "Seem. ex Hook., Arn. & Benth., 1854");
    }

    #[test]
    fn authorship_contradiction() {
        let a = Authorship {
            authors: vec!["Mill.".into()],
            ..Authorship::default()
        };
        let b = Authorship {
            authors: vec!["L.".into()],
            ..Authorship::default()
        };
        let empty = Authorship::default();

        assert!(a.contradicts(&b));
        assert!(!a.contradicts(&a.clone()));
        assert!(!a.contradicts(&empty));
    }
}
