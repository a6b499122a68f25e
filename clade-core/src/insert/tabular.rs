//! Tab-separated checklist files on disk.
//!
//! The checklist directory is probed with the configured glob patterns:
//! one core taxon file plus optional vernacular and distribution files
//! joined on the taxon identifier. Headers map columns to [`Term`]s;
//! unknown columns are carried past silently. Extension files are small
//! compared to the core and are loaded up front; the core itself streams.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::terms::Term;
use crate::types::{MappingFlags, VerbatimRecord};

use super::traits::{RecordSource, flags_for_terms};

type ExtensionRows = HashMap<String, Vec<BTreeMap<Term, String>>>;

/// Record source over tab-separated files in one directory.
#[derive(Debug)]
pub struct TabularSource {
    core_path: PathBuf,
    header: Vec<Option<Term>>,
    flags: MappingFlags,
    vernaculars: ExtensionRows,
    distributions: ExtensionRows,
}

impl TabularSource {
    /// Probe the directory and read everything but the core rows.
    pub fn open(dir: &Path, config: &SourceConfig) -> Result<Self, SourceError> {
        let core_path = find_file(dir, &config.core_pattern)?
            .ok_or_else(|| SourceError::NoCoreFile(config.core_pattern.clone()))?;
        let header = read_header(&core_path)?;
        if !header
            .iter()
            .flatten()
            .any(|t| matches!(t, Term::ScientificName | Term::Genus))
        {
            return Err(SourceError::InvalidHeader {
                file: core_path.display().to_string(),
                reason: "no scientificName or genus column".into(),
            });
        }
        let flags = flags_for_terms(header.iter().flatten());
        let vernaculars = match find_file(dir, &config.vernacular_pattern)? {
            Some(path) => read_extension(&path)?,
            None => HashMap::new(),
        };
        let distributions = match find_file(dir, &config.distribution_pattern)? {
            Some(path) => read_extension(&path)?,
            None => HashMap::new(),
        };
        info!(
            core = %core_path.display(),
            vernacular_taxa = vernaculars.len(),
            distribution_taxa = distributions.len(),
            "opened checklist source"
        );
        Ok(Self {
            core_path,
            header,
            flags,
            vernaculars,
            distributions,
        })
    }

    /// The core file this source reads from.
    pub fn core_path(&self) -> &Path {
        &self.core_path
    }
}

impl RecordSource for TabularSource {
    fn mapping_flags(&self) -> MappingFlags {
        self.flags
    }

    fn records(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = Result<VerbatimRecord, SourceError>> + '_>, SourceError>
    {
        let file = File::open(&self.core_path)?;
        let mut lines = BufReader::new(file).lines();
        if let Some(first) = lines.next() {
            first?;
        }
        let header = self.header.clone();
        let vernaculars = &self.vernaculars;
        let distributions = &self.distributions;
        let iter = lines.filter_map(move |line| {
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(SourceError::Io(err))),
            };
            if line.trim().is_empty() {
                return None;
            }
            let mut record = VerbatimRecord::new();
            for (slot, raw) in header.iter().zip(line.split('\t')) {
                let Some(term) = slot else { continue };
                let (value, changed) = unescape(raw);
                if changed {
                    record.unescaped = true;
                }
                if value.trim().is_empty() {
                    continue;
                }
                record.set(*term, value);
            }
            if record.terms.is_empty() {
                return None;
            }
            if let Some(id) = record.value(Term::TaxonId).map(str::to_string) {
                if let Some(rows) = vernaculars.get(&id) {
                    record.vernacular_rows = rows.clone();
                }
                if let Some(rows) = distributions.get(&id) {
                    record.distribution_rows = rows.clone();
                }
            }
            Some(Ok(record))
        });
        Ok(Box::new(iter))
    }
}

/// First existing file matching the pattern inside the directory, sorted
/// for determinism.
fn find_file(dir: &Path, pattern: &str) -> Result<Option<PathBuf>, SourceError> {
    let full = dir.join(pattern);
    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&full.to_string_lossy())? {
        matches.push(entry?);
    }
    matches.sort();
    if matches.len() > 1 {
        warn!(pattern, count = matches.len(), "multiple files match, using the first");
    }
    Ok(matches.into_iter().next())
}

fn read_header(path: &Path) -> Result<Vec<Option<Term>>, SourceError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let Some(first) = lines.next() else {
        return Err(SourceError::InvalidHeader {
            file: path.display().to_string(),
            reason: "file is empty".into(),
        });
    };
    Ok(first?.split('\t').map(Term::parse).collect())
}

/// Extension rows keyed by taxon id. The id column itself is dropped from
/// each row.
fn read_extension(path: &Path) -> Result<ExtensionRows, SourceError> {
    let header = read_header(path)?;
    let file = File::open(path)?;
    let mut rows: ExtensionRows = HashMap::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if i == 0 || line.trim().is_empty() {
            continue;
        }
        let mut row: BTreeMap<Term, String> = BTreeMap::new();
        for (slot, raw) in header.iter().zip(line.split('\t')) {
            let Some(term) = slot else { continue };
            let (value, _) = unescape(raw);
            if value.trim().is_empty() {
                continue;
            }
            row.insert(*term, value);
        }
        let Some(id) = row.remove(&Term::TaxonId) else {
            continue;
        };
        rows.entry(id).or_default().push(row);
    }
    Ok(rows)
}

/// Replace backslash escapes with their real characters. The flag reports
/// whether anything changed, which verification surfaces as an issue.
fn unescape(raw: &str) -> (String, bool) {
    if !raw.contains('\\') {
        return (raw.to_string(), false);
    }
    let mut out = String::with_capacity(raw.len());
    let mut changed = false;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => {
                out.push('\t');
                changed = true;
            }
            Some('n') => {
                out.push('\n');
                changed = true;
            }
            Some('r') => {
                out.push('\r');
                changed = true;
            }
            Some('\\') => {
                out.push('\\');
                changed = true;
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    (out, changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn open(dir: &Path) -> Result<TabularSource, SourceError> {
        TabularSource::open(dir, &SourceConfig::default())
    }

    #[test]
    fn reads_core_rows_and_derives_flags() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "taxon.txt",
            "taxonID\tscientificName\ttaxonRank\tparentNameUsageID\n\
             1\tPinaceae\tfamily\t\n\
             2\tAbies alba\tspecies\t1\n",
        );
        let mut source = open(dir.path()).unwrap();
        assert!(source.mapping_flags().parent_name_mapped);
        assert!(!source.mapping_flags().accepted_name_mapped);

        let records: Vec<_> = source.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value(Term::ScientificName), Some("Pinaceae"));
        assert_eq!(records[1].value(Term::ParentNameUsageId), Some("1"));
        assert!(!records[1].unescaped);
    }

    #[test]
    fn missing_core_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open(dir.path()).unwrap_err();
        assert!(matches!(err, SourceError::NoCoreFile(_)));
    }

    #[test]
    fn header_without_name_material_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "taxon.txt", "taxonID\ttaxonRank\n1\tspecies\n");
        let err = open(dir.path()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidHeader { .. }));
    }

    #[test]
    fn unknown_columns_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "taxon.txt",
            "taxonID\tcustomColumn\tscientificName\n1\twhatever\tAbies alba\n",
        );
        let mut source = open(dir.path()).unwrap();
        let records: Vec<_> = source.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(records[0].terms.len(), 2);
    }

    #[test]
    fn escape_sequences_are_unescaped_and_flagged() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "taxon.txt",
            "taxonID\tscientificName\ttaxonRemarks\n1\tAbies alba\tline one\\nline two\n",
        );
        let mut source = open(dir.path()).unwrap();
        let records: Vec<_> = source.records().unwrap().map(Result::unwrap).collect();
        assert!(records[0].unescaped);
        assert_eq!(
            records[0].value(Term::TaxonRemarks),
            Some("line one\nline two")
        );
    }

    #[test]
    fn extension_rows_are_joined_on_the_taxon_id() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "taxon.txt",
            "taxonID\tscientificName\n1\tAbies alba\n2\tPicea abies\n",
        );
        write(
            dir.path(),
            "vernacular.txt",
            "taxonID\tvernacularName\tlanguage\n1\tsilver fir\ten\n1\tWeisstanne\tde\n",
        );
        write(
            dir.path(),
            "distribution.txt",
            "taxonID\tlocationID\n2\ttdwg:GER\n",
        );
        let mut source = open(dir.path()).unwrap();
        let records: Vec<_> = source.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(records[0].vernacular_rows.len(), 2);
        assert_eq!(
            records[0].vernacular_rows[1].get(&Term::VernacularName),
            Some(&"Weisstanne".to_string())
        );
        assert!(records[0].distribution_rows.is_empty());
        assert_eq!(records[1].distribution_rows.len(), 1);
    }

    #[test]
    fn blank_lines_and_blank_values_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "taxon.txt",
            "taxonID\tscientificName\ttaxonRank\n\n1\tAbies alba\t\n",
        );
        let mut source = open(dir.path()).unwrap();
        let records: Vec<_> = source.records().unwrap().map(Result::unwrap).collect();
        assert_eq!(records.len(), 1);
        assert!(!records[0].has(Term::TaxonRank));
    }
}
