//! Structural name validation.
//!
//! Pure checks over an interpreted [`Name`]: do the populated atoms make
//! sense together, and do they fit the claimed rank? Findings are returned
//! as [`Diagnostics`], never errors. Only atomized names are audited;
//! unparsable types (viruses, placeholders) pass through untouched.

use clade_graph::Rank;

use crate::name::Name;
use crate::types::{Diagnostics, Issue};

/// The atom slots a rank category can require or forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom {
    Uninomial,
    Genus,
    Infrageneric,
    Specific,
    Infraspecific,
}

/// One row of the rank table: when `applies` holds for the name's rank, all
/// `required` atoms must be present and all `banned` atoms absent.
struct CategoryRule {
    applies: fn(Rank) -> bool,
    required: &'static [Atom],
    banned: &'static [Atom],
}

/// New ranks participate by extending the category predicates on [`Rank`],
/// not by growing this table.
static CATEGORY_RULES: [CategoryRule; 4] = [
    CategoryRule {
        applies: Rank::is_genus_or_suprageneric,
        required: &[Atom::Uninomial],
        banned: &[Atom::Genus],
    },
    CategoryRule {
        applies: Rank::is_infrageneric_supraspecific,
        required: &[Atom::Infrageneric],
        banned: &[Atom::Specific, Atom::Infraspecific],
    },
    CategoryRule {
        applies: |rank| rank.is_species_or_below() && !rank.is_infraspecific(),
        required: &[Atom::Specific],
        banned: &[Atom::Infraspecific],
    },
    CategoryRule {
        applies: Rank::is_infraspecific,
        required: &[Atom::Specific, Atom::Infraspecific],
        banned: &[],
    },
];

fn atom(name: &Name, slot: Atom) -> Option<&str> {
    let value = match slot {
        Atom::Uninomial => &name.uninomial,
        Atom::Genus => &name.genus,
        Atom::Infrageneric => &name.infrageneric_epithet,
        Atom::Specific => &name.specific_epithet,
        Atom::Infraspecific => &name.infraspecific_epithet,
    };
    value.as_deref()
}

/// Flags every structural problem found on the name.
pub fn flag_issues(name: &Name) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    if !name.is_parsed() {
        return diagnostics;
    }

    // Atoms that cannot coexist, regardless of rank.
    if atom(name, Atom::Uninomial).is_some()
        && [
            Atom::Genus,
            Atom::Infrageneric,
            Atom::Specific,
            Atom::Infraspecific,
        ]
        .iter()
        .any(|slot| atom(name, *slot).is_some())
    {
        diagnostics.flag(Issue::InconsistentName);
    }
    if (atom(name, Atom::Specific).is_some() || atom(name, Atom::Infrageneric).is_some())
        && atom(name, Atom::Genus).is_none()
    {
        diagnostics.flag(Issue::InconsistentName);
    }
    if atom(name, Atom::Infraspecific).is_some() && atom(name, Atom::Specific).is_none() {
        diagnostics.flag(Issue::InconsistentName);
    }

    // Rank category rules.
    if let Some(rank) = name.rank {
        if rank.not_other_or_unranked() {
            for rule in &CATEGORY_RULES {
                if !(rule.applies)(rank) {
                    continue;
                }
                let missing = rule.required.iter().any(|slot| atom(name, *slot).is_none());
                let surplus = rule.banned.iter().any(|slot| atom(name, *slot).is_some());
                if missing || surplus {
                    diagnostics.flag(Issue::InconsistentName);
                }
            }
        }
    }

    // Character audit over all populated atoms.
    let slots = [
        Atom::Uninomial,
        Atom::Genus,
        Atom::Infrageneric,
        Atom::Specific,
        Atom::Infraspecific,
    ];
    for slot in slots {
        if let Some(value) = atom(name, slot) {
            if value.chars().any(|c| !is_name_char(c)) {
                diagnostics.flag(Issue::UnusualNameCharacters);
            }
        }
    }

    diagnostics
}

// The diaeresis is tolerated in botanical names (Isoëtes, Cephaëlis).
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == 'ë' || c == 'Ë'
}
