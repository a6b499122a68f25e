//! The name-parsing seam.
//!
//! [`NameParser`] is the service boundary; [`BasicParser`] is the built-in
//! heuristic implementation. It classifies the string first (virus, hybrid
//! formula, placeholder, informal) and only atomizes parsable types:
//! capitalized head, optional infrageneric part, lowercase epithets with
//! their rank markers, authorship tail.

use clade_graph::Rank;

use crate::name::{Authorship, Name};
use crate::types::NameType;

/// Combination and original authorship parsed from one string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAuthorship {
    pub basionym: Authorship,
    pub combination: Authorship,
}

/// Parsing service used by interpretation and name lookups.
pub trait NameParser: Send + Sync {
    /// Parse a full scientific name string. The rank hint guides marker
    /// interpretation but is never required.
    fn parse(&self, text: &str, rank_hint: Option<Rank>) -> Name;

    /// Parse a bare authorship string. `None` when nothing author-like can
    /// be recognized.
    fn parse_authorship(&self, text: &str) -> Option<ParsedAuthorship>;
}

const VIRUS_MARKERS: [&str; 4] = ["virus", "viroid", "phage", "ictv"];
const PLACEHOLDER_MARKERS: [&str; 4] = ["incertae sedis", "unassigned", "unplaced", "unknown"];
const INFORMAL_MARKERS: [&str; 4] = ["sp.", "spp.", "cf.", "aff."];

/// Heuristic whitespace-token parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicParser;

impl NameParser for BasicParser {
    fn parse(&self, text: &str, rank_hint: Option<Rank>) -> Name {
        let text = collapse_whitespace(text);
        let mut name = Name::default();
        name.rank = rank_hint;
        if text.is_empty() {
            name.name_type = Some(NameType::NoName);
            return name;
        }

        let lower = text.to_lowercase();
        if VIRUS_MARKERS.iter().any(|m| lower.contains(m)) {
            name.name_type = Some(NameType::Virus);
            name.scientific_name = Some(text);
            return name;
        }
        if text.contains('×') || text.split_whitespace().any(|t| t == "x") {
            name.name_type = Some(NameType::HybridFormula);
            name.scientific_name = Some(text);
            return name;
        }
        if text == "?" || PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m)) {
            name.name_type = Some(NameType::Placeholder);
            name.scientific_name = Some(text);
            return name;
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let head = tokens[0];
        if !is_capitalized_word(head) {
            name.name_type = Some(NameType::NoName);
            name.scientific_name = Some(text);
            return name;
        }
        if tokens.iter().any(|t| INFORMAL_MARKERS.contains(t)) {
            name.name_type = Some(NameType::Informal);
            name.genus = Some(head.to_string());
            name.scientific_name = Some(text);
            return name;
        }

        name.name_type = Some(NameType::Scientific);
        let mut i = 1;
        let mut genus_like = false;

        // Infrageneric part directly after the head, either bracketed or
        // introduced by a marker.
        if i < tokens.len() {
            if let Some(inner) = parenthesized_epithet(tokens[i]) {
                name.infrageneric_epithet = Some(inner.to_string());
                genus_like = true;
                i += 1;
            } else if let Some(rank) = infrageneric_marker_rank(tokens[i]) {
                if i + 1 < tokens.len() && is_capitalized_word(tokens[i + 1]) {
                    name.infrageneric_epithet = Some(tokens[i + 1].to_string());
                    genus_like = true;
                    apply_marker_rank(&mut name, rank);
                    i += 2;
                }
            }
        }

        if i < tokens.len() && is_epithet(tokens[i]) {
            name.specific_epithet = Some(tokens[i].to_string());
            genus_like = true;
            i += 1;
            if i < tokens.len() {
                if let Some(rank) = infraspecific_marker_rank(tokens[i]) {
                    if i + 1 < tokens.len() && is_epithet(tokens[i + 1]) {
                        name.infraspecific_epithet = Some(tokens[i + 1].to_string());
                        apply_marker_rank(&mut name, rank);
                        i += 2;
                    }
                } else if is_epithet(tokens[i]) {
                    // Markerless trinomial.
                    name.infraspecific_epithet = Some(tokens[i].to_string());
                    i += 1;
                }
            }
        }

        if genus_like {
            name.genus = Some(head.to_string());
        } else {
            name.uninomial = Some(head.to_string());
        }

        if i < tokens.len() {
            let rest = tokens[i..].join(" ");
            match self.parse_authorship(&rest) {
                Some(parsed) => {
                    name.basionym_authorship = parsed.basionym;
                    name.authorship = parsed.combination;
                }
                // Keep the raw tail so nothing is lost.
                None => name.authorship.authors.push(rest),
            }
        }
        name
    }

    fn parse_authorship(&self, text: &str) -> Option<ParsedAuthorship> {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return None;
        }
        if !text.chars().any(char::is_uppercase) && !text.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut parsed = ParsedAuthorship::default();
        let rest = match split_basionym_brackets(&text) {
            Some((basionym, rest)) => {
                parsed.basionym = parse_team(basionym);
                rest
            }
            None => text.as_str(),
        };
        parsed.combination = parse_team(rest);
        if parsed.basionym.is_empty() && parsed.combination.is_empty() {
            return None;
        }
        Some(parsed)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_capitalized_word(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(char::is_uppercase)
        && chars.all(|c| c.is_alphabetic() || c == '-')
}

fn is_epithet(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_lowercase() && c.is_alphabetic())
        && chars.all(|c| (c.is_alphabetic() && !c.is_uppercase()) || c == '-')
}

/// `(Strobus)` after the genus. Authorship brackets like `(L.)` are told
/// apart by the dot and length.
fn parenthesized_epithet(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('(')?.strip_suffix(')')?;
    if inner.len() > 2 && is_capitalized_word(inner) {
        Some(inner)
    } else {
        None
    }
}

fn infrageneric_marker_rank(token: &str) -> Option<Rank> {
    let rank = Rank::parse(token)?;
    matches!(rank, Rank::Subgenus | Rank::Section | Rank::Series).then_some(rank)
}

fn infraspecific_marker_rank(token: &str) -> Option<Rank> {
    let rank = Rank::parse(token)?;
    matches!(
        rank,
        Rank::Subspecies | Rank::Variety | Rank::Subvariety | Rank::Form | Rank::Subform
    )
    .then_some(rank)
}

/// A marker rank beats an absent or uncomparable hint, never a real one.
fn apply_marker_rank(name: &mut Name, rank: Rank) {
    if name.rank.is_none_or(Rank::is_uncomparable) {
        name.rank = Some(rank);
    }
}

fn split_basionym_brackets(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('(')?;
    let close = rest.find(')')?;
    Some((&rest[..close], rest[close + 1..].trim_start()))
}

/// One author team: optional ex-authors, authors, year.
fn parse_team(part: &str) -> Authorship {
    let mut authorship = Authorship::default();
    let part = part.trim();
    if part.is_empty() {
        return authorship;
    }
    let normalized = part.replace(" et ", " & ");
    let mut body = String::new();
    for piece in normalized.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if is_year(piece) {
            authorship.year = Some(piece.to_string());
        } else {
            if !body.is_empty() {
                body.push_str(", ");
            }
            body.push_str(piece);
        }
    }
    match body.split_once(" ex ") {
        Some((ex, main)) => {
            authorship.ex_authors = split_authors(ex);
            authorship.authors = split_authors(main);
        }
        None => authorship.authors = split_authors(&body),
    }
    authorship
}

fn split_authors(text: &str) -> Vec<String> {
    text.split(['&', ','])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_year(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && (token.starts_with('1') || token.starts_with('2'))
}
