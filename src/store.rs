// Record store: JSONL source of truth with a SQLite cache

use crate::jsonl::{self, Entry};
use crate::record::{Record, apply_patch, now_ms};
use eyre::{Context, Result, eyre};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;

/// Name of the store directory created inside the store path
pub const STORE_DIR: &str = ".hiretrack";

/// Document collections keyed by record id.
///
/// No ordering is promised by `list`, and there are no transactions across calls.
pub trait RecordStore {
    fn list<T: Record>(&self) -> Result<Vec<T>>;

    fn get<T: Record>(&self, id: &str) -> Result<Option<T>>;

    /// Store a new record and return its id. Fails if the id is taken.
    fn create<T: Record>(&mut self, record: T) -> Result<String>;

    /// Merge a partial record (JSON object) into the stored one.
    /// Fails if the record does not exist.
    fn update<T: Record>(&mut self, id: &str, patch: &Value) -> Result<()>;

    /// Fails if the record does not exist.
    fn delete<T: Record>(&mut self, id: &str) -> Result<()>;
}

/// Durable store: one append-only `{collection}.jsonl` per collection plus a SQLite cache
pub struct Store {
    base_path: PathBuf,
    db: Connection,
}

impl Store {
    /// Open or create a store at the given path
    ///
    /// The store lives in a `.hiretrack` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(STORE_DIR);

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let db_path = base_path.join("hiretrack.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let mut store = Self { base_path, db };

        store.create_schema()?;
        store.create_gitignore()?;
        store.write_version()?;

        if store.is_stale()? {
            info!("Database is stale, syncing from JSONL files");
            store.sync()?;
        }

        Ok(store)
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);

            -- Sync metadata for staleness detection
            CREATE TABLE IF NOT EXISTS sync_metadata (
                collection TEXT PRIMARY KEY,
                last_sync_time INTEGER NOT NULL,
                file_mtime INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "hiretrack.db\nhiretrack.db-shm\nhiretrack.db-wal\n")?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    fn jsonl_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", collection))
    }

    /// Check if the cache needs rebuilding from JSONL
    ///
    /// True if any JSONL file changed since the last sync or was never synced.
    pub fn is_stale(&self) -> Result<bool> {
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }

            let Some(collection) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let current_mtime = file_mtime(&path)?;
            let stored_mtime: Option<i64> = self
                .db
                .query_row(
                    "SELECT file_mtime FROM sync_metadata WHERE collection = ?1",
                    [collection],
                    |row| row.get(0),
                )
                .optional()?;

            match stored_mtime {
                None => return Ok(true),
                Some(mtime) if current_mtime > mtime => return Ok(true),
                _ => continue,
            }
        }

        Ok(false)
    }

    /// Rebuild the SQLite cache from the JSONL files
    pub fn sync(&mut self) -> Result<()> {
        info!("Syncing database from JSONL files");

        let tx = self.db.transaction()?;
        tx.execute("DELETE FROM records", [])?;

        for dir_entry in fs::read_dir(&self.base_path)? {
            let path = dir_entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }

            let collection = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| eyre!("Invalid JSONL filename: {:?}", path))?
                .to_string();

            debug!(collection = %collection, "Syncing collection");

            let current_mtime = file_mtime(&path)?;
            let entries: HashMap<String, Entry> = jsonl::read_jsonl_latest(&path)?;

            let mut live = 0;
            for (id, entry) in entries {
                let Some(data) = entry.data.filter(|_| !entry.deleted) else {
                    continue;
                };

                tx.execute(
                    "INSERT OR REPLACE INTO records (collection, id, data_json, updated_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![collection, &id, serde_json::to_string(&data)?, entry.updated_at],
                )?;
                live += 1;
            }

            tx.execute(
                "INSERT OR REPLACE INTO sync_metadata (collection, last_sync_time, file_mtime)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![collection, now_ms(), current_mtime],
            )?;

            debug!(collection = %collection, live, "Collection synced");
        }

        tx.commit()?;
        info!("Sync complete");
        Ok(())
    }

    /// Append a new record version to the log and upsert it into the cache.
    ///
    /// The JSONL log is authoritative: once the append succeeds the write is durable,
    /// even if the cache upsert then fails. The next `sync` brings the cache back in line.
    fn put<T: Record>(&mut self, record: &T) -> Result<()> {
        let collection = T::collection_name();
        let data = serde_json::to_value(record).context("Failed to serialize record")?;
        let data_json = serde_json::to_string(&data)?;

        jsonl::append_jsonl(
            &self.jsonl_path(collection),
            &Entry::put(record.id(), record.updated_at(), data),
        )?;

        self.db.execute(
            "INSERT OR REPLACE INTO records (collection, id, data_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![collection, record.id(), data_json, record.updated_at()],
        )
        .context("Record written to JSONL but the cache update failed; run sync to rebuild the cache")?;

        Ok(())
    }

    fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .db
            .query_row(
                "SELECT 1 FROM records WHERE collection = ?1 AND id = ?2",
                rusqlite::params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn validate_collection_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(eyre!("Collection name cannot be empty"));
        }
        if name.len() > 64 {
            return Err(eyre!("Collection name too long: {} (max 64 chars)", name));
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!(
                "Invalid collection name: {} (must be alphanumeric with _/-)",
                name
            ));
        }
        Ok(())
    }

    fn validate_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(eyre!("Record ID cannot be empty or whitespace-only"));
        }
        if id.len() > 256 {
            return Err(eyre!("Record ID too long: {} chars (max 256)", id.len()));
        }
        Ok(())
    }
}

impl RecordStore for Store {
    fn list<T: Record>(&self) -> Result<Vec<T>> {
        let collection = T::collection_name();

        let mut stmt = self
            .db
            .prepare("SELECT data_json FROM records WHERE collection = ?1 ORDER BY updated_at DESC")?;
        let rows = stmt.query_map([collection], |row| row.get::<_, String>(0))?;

        let mut results = Vec::new();
        for row_result in rows {
            let data_json = row_result?;
            let record: T = serde_json::from_str(&data_json).context("Failed to deserialize record")?;
            results.push(record);
        }

        debug!(collection, count = results.len(), "list: loaded");
        Ok(results)
    }

    fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        let collection = T::collection_name();

        let json: Option<String> = self
            .db
            .query_row(
                "SELECT data_json FROM records WHERE collection = ?1 AND id = ?2",
                rusqlite::params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => {
                let record: T = serde_json::from_str(&json).context("Failed to deserialize record from database")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn create<T: Record>(&mut self, record: T) -> Result<String> {
        let collection = T::collection_name();
        Self::validate_collection_name(collection)?;

        let id = record.id().to_string();
        Self::validate_id(&id)?;

        if self.exists(collection, &id)? {
            return Err(eyre!("Record already exists: {}/{}", collection, id));
        }

        self.put(&record)?;
        info!(collection, id = %id, "Created record");
        Ok(id)
    }

    fn update<T: Record>(&mut self, id: &str, patch: &Value) -> Result<()> {
        let collection = T::collection_name();

        let current = self
            .get::<T>(id)?
            .ok_or_else(|| eyre!("Record not found: {}/{}", collection, id))?;

        let mut patched = apply_patch(&current, patch)?;
        patched.touch(now_ms());
        self.put(&patched)?;

        info!(collection, id, "Updated record");
        Ok(())
    }

    fn delete<T: Record>(&mut self, id: &str) -> Result<()> {
        let collection = T::collection_name();

        if !self.exists(collection, id)? {
            return Err(eyre!("Record not found: {}/{}", collection, id));
        }

        jsonl::append_jsonl(&self.jsonl_path(collection), &Entry::tombstone(id, now_ms()))?;

        self.db.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            rusqlite::params![collection, id],
        )?;

        info!(collection, id, "Deleted record");
        Ok(())
    }
}

fn file_mtime(path: &Path) -> Result<i64> {
    Ok(fs::metadata(path)?
        .modified()?
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0))
}
