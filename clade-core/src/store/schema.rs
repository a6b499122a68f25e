//! SQLite schema for the usage payload store.
//!
//! The graph topology lives in memory ([`clade_graph::TaxonGraph`]); this
//! database holds the heavyweight per-node payloads (interpreted usages as
//! JSON), the raw verbatim records they were built from, and a small
//! key/value table for run metadata.

/// Bumped whenever the schema changes incompatibly.
pub const SCHEMA_VERSION: i32 = 1;

/// Core tables. Executed as one batch on every open; all statements are
/// idempotent.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS usages (
    node_id     INTEGER PRIMARY KEY,
    taxon_id    TEXT,
    payload     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_usages_taxon_id ON usages(taxon_id);

CREATE TABLE IF NOT EXISTS verbatim (
    key         INTEGER PRIMARY KEY,
    payload     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS meta (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL
);
";

/// Reporting views over the JSON payloads. Kept separate from the tables so
/// they can evolve without a schema version bump.
pub const VIEWS_SQL: &str = "
CREATE VIEW IF NOT EXISTS v_issue_counts AS
SELECT je.value AS issue, COUNT(*) AS usages
FROM usages, json_each(usages.payload, '$.diagnostics.issues') AS je
GROUP BY je.value
ORDER BY usages DESC;

CREATE VIEW IF NOT EXISTS v_status_counts AS
SELECT COALESCE(json_extract(payload, '$.status'), 'unknown') AS status,
       COUNT(*) AS usages
FROM usages
GROUP BY status
ORDER BY usages DESC;

CREATE VIEW IF NOT EXISTS v_rank_counts AS
SELECT COALESCE(json_extract(payload, '$.name.rank'), 'unranked') AS rank,
       COUNT(*) AS usages
FROM usages
GROUP BY rank
ORDER BY usages DESC;
";

/// Meta keys written by the engine.
pub mod meta_keys {
    pub const SCHEMA_VERSION: &str = "schema_version";
    pub const INSERTION_METADATA: &str = "insertion_metadata";
}
