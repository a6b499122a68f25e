//! SQLite-backed payload store.
//!
//! One connection, owned by the store. The normalizer is single-threaded, so
//! no locking is needed; callers that mutate transactional state take
//! `&mut self` to keep the bulk/transaction bookkeeping honest.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use clade_graph::NodeId;

use crate::error::StoreError;
use crate::store::schema;
use crate::types::{InsertionMetadata, NameUsage, VerbatimKey, VerbatimRecord};

/// Persistent home of interpreted usages and their verbatim sources.
///
/// Keys are the in-memory graph node ids, so the two sides of the store can
/// always be joined.
#[derive(Debug)]
pub struct PayloadStore {
    conn: Connection,
    db_path: Option<PathBuf>,
    bulk: bool,
}

impl PayloadStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            db_path: Some(path.to_path_buf()),
            bulk: false,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Opens an in-memory store, mostly for tests and small runs.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            db_path: None,
            bulk: false,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;",
        )?;
        // WAL needs filesystem support; fall back silently when unavailable.
        let _ = self.conn.execute_batch("PRAGMA journal_mode = WAL;");
        self.conn.execute_batch(schema::SCHEMA_SQL)?;
        self.conn.execute_batch(schema::VIEWS_SQL)?;
        self.set_meta(
            schema::meta_keys::SCHEMA_VERSION,
            &schema::SCHEMA_VERSION.to_string(),
        )?;
        Ok(())
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Size of the backing file in bytes, if there is one.
    pub fn file_size(&self) -> Option<u64> {
        let path = self.db_path.as_ref()?;
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    // ── Usages ───────────────────────────────────────────────────

    /// Writes (or overwrites) the payload for a node.
    pub fn put_usage(&self, id: NodeId, usage: &NameUsage) -> Result<(), StoreError> {
        let payload = serde_json::to_string(usage)?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO usages (node_id, taxon_id, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(node_id) DO UPDATE SET taxon_id = ?2, payload = ?3",
        )?;
        stmt.execute(params![i64::from(id), usage.taxon_id, payload])?;
        Ok(())
    }

    /// Reads the payload for a node, `None` if the node has none.
    pub fn get_usage(&self, id: NodeId) -> Result<Option<NameUsage>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT payload FROM usages WHERE node_id = ?1")?;
        let payload: Option<String> = stmt
            .query_row(params![i64::from(id)], |row| row.get(0))
            .optional()?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Like [`Self::get_usage`] but a missing payload is an error.
    pub fn require_usage(&self, id: NodeId) -> Result<NameUsage, StoreError> {
        self.get_usage(id)?.ok_or(StoreError::MissingUsage(id))
    }

    /// All nodes carrying the given source identifier. More than one entry
    /// means the source data reused the id.
    pub fn nodes_by_taxon_id(&self, taxon_id: &str) -> Result<Vec<NodeId>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT node_id FROM usages WHERE taxon_id = ?1 ORDER BY node_id")?;
        let rows = stmt.query_map(params![taxon_id], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(decode_node_id(raw?)?);
        }
        Ok(out)
    }

    /// All stored node ids in ascending order.
    pub fn usage_ids(&self) -> Result<Vec<NodeId>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT node_id FROM usages ORDER BY node_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(decode_node_id(raw?)?);
        }
        Ok(out)
    }

    /// Loads every stored usage. Intended for export and reporting, not for
    /// the normalization passes themselves.
    pub fn load_all(&self) -> Result<Vec<(NodeId, NameUsage)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT node_id, payload FROM usages ORDER BY node_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (raw, json) = row?;
            out.push((decode_node_id(raw)?, serde_json::from_str(&json)?));
        }
        Ok(out)
    }

    /// Number of stored usages.
    pub fn usage_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM usages", [], |row| row.get(0))?;
        #[allow(clippy::cast_sign_loss)]
        Ok(count as u64)
    }

    // ── Verbatim records ─────────────────────────────────────────

    /// Stores the raw record a usage was interpreted from.
    pub fn put_verbatim(
        &self,
        key: VerbatimKey,
        record: &VerbatimRecord,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO verbatim (key, payload) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET payload = ?2",
        )?;
        stmt.execute(params![i64::from(key), payload])?;
        Ok(())
    }

    /// Reads a verbatim record back.
    pub fn get_verbatim(&self, key: VerbatimKey) -> Result<Option<VerbatimRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT payload FROM verbatim WHERE key = ?1")?;
        let payload: Option<String> = stmt
            .query_row(params![i64::from(key)], |row| row.get(0))
            .optional()?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // ── Metadata ─────────────────────────────────────────────────

    /// Upserts a metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// Reads a metadata value.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Persists the insertion run metadata.
    pub fn save_metadata(&self, meta: &InsertionMetadata) -> Result<(), StoreError> {
        let json = serde_json::to_string(meta)?;
        self.set_meta(schema::meta_keys::INSERTION_METADATA, &json)
    }

    /// Reads the insertion run metadata back, `None` before the first run.
    pub fn load_metadata(&self) -> Result<Option<InsertionMetadata>, StoreError> {
        match self.get_meta(schema::meta_keys::INSERTION_METADATA)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // ── Reporting ────────────────────────────────────────────────

    /// Issue frequencies over all stored usages, most frequent first.
    pub fn issue_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.view_counts("SELECT issue, usages FROM v_issue_counts")
    }

    /// Taxonomic status frequencies, most frequent first.
    pub fn status_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.view_counts("SELECT status, usages FROM v_status_counts")
    }

    /// Rank frequencies, most frequent first.
    pub fn rank_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.view_counts("SELECT rank, usages FROM v_rank_counts")
    }

    fn view_counts(&self, sql: &str) -> Result<Vec<(String, u64)>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (label, count) = row?;
            #[allow(clippy::cast_sign_loss)]
            out.push((label, count as u64));
        }
        Ok(out)
    }

    // ── Transactions ─────────────────────────────────────────────

    /// Switches into bulk-load mode: durability off, one long transaction.
    /// Call [`Self::end_bulk`] to land the data.
    pub fn start_bulk(&mut self) -> Result<(), StoreError> {
        if self.bulk {
            return Ok(());
        }
        self.conn.execute_batch("PRAGMA synchronous = OFF;")?;
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.bulk = true;
        debug!("payload store entered bulk mode");
        Ok(())
    }

    /// Commits the bulk transaction and restores normal durability.
    pub fn end_bulk(&mut self) -> Result<(), StoreError> {
        if !self.bulk {
            return Ok(());
        }
        self.conn.execute_batch("COMMIT")?;
        self.conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        self.bulk = false;
        debug!("payload store left bulk mode");
        Ok(())
    }

    /// Opens an explicit transaction for a batch of updates.
    pub fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    /// Commits the current explicit transaction.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Rolls the current explicit transaction back.
    pub fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Closes the store, committing a still-open bulk transaction first.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.end_bulk()?;
        // Drop runs the sqlite close handshake.
        Ok(())
    }

    /// Closes the store and removes its files from disk.
    pub fn close_and_delete(mut self) -> Result<(), StoreError> {
        self.end_bulk()?;
        let path = self.db_path.take();
        drop(self);
        if let Some(path) = path {
            remove_db_files(&path)?;
        }
        Ok(())
    }
}

fn decode_node_id(raw: i64) -> Result<NodeId, StoreError> {
    NodeId::try_from(raw).map_err(|_| StoreError::Corrupt(format!("node id {raw} out of range")))
}

fn remove_db_files(path: &Path) -> Result<(), StoreError> {
    std::fs::remove_file(path)?;
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            std::fs::remove_file(side)?;
        }
    }
    Ok(())
}
