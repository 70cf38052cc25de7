// JSONL file operations

use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

/// One line of a collection log: a full record version or a tombstone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Entry {
    pub fn put(id: &str, updated_at: i64, data: Value) -> Self {
        Self {
            id: id.to_string(),
            updated_at,
            deleted: false,
            data: Some(data),
        }
    }

    pub fn tombstone(id: &str, updated_at: i64) -> Self {
        Self {
            id: id.to_string(),
            updated_at,
            deleted: true,
            data: None,
        }
    }
}

/// Append a line to a JSONL file under an exclusive lock
pub fn append_jsonl<T: Serialize>(path: &Path, line: &T) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open JSONL file for appending")?;

    file.lock_exclusive().context("Failed to acquire file lock")?;

    let json = serde_json::to_string(line)?;
    writeln!(file, "{}", json)?;
    file.sync_all()?; // Ensure data is flushed to disk

    // Lock is released when file is dropped
    Ok(())
}

/// Read all lines from a JSONL file, returning the latest version per ID
///
/// For duplicate IDs the highest `updated_at` wins; on a tie the later line wins.
/// Unreadable or malformed lines are skipped with a warning.
pub fn read_jsonl_latest<T>(path: &Path) -> Result<HashMap<String, T>>
where
    T: DeserializeOwned + HasId + HasUpdatedAt,
{
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let file = File::open(path).context("Failed to open JSONL file")?;
    let reader = BufReader::new(file);
    let mut records: HashMap<String, T> = HashMap::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let record: T = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
                continue;
            }
        };

        let newer = records
            .get(record.id())
            .is_none_or(|existing| record.updated_at() >= existing.updated_at());
        if newer {
            records.insert(record.id().to_string(), record);
        }
    }

    info!(
        file = ?path,
        count = records.len(),
        "Loaded latest records from JSONL"
    );

    Ok(records)
}

/// Trait for log lines that carry an ID
pub trait HasId {
    fn id(&self) -> &str;
}

/// Trait for log lines that carry a write timestamp
pub trait HasUpdatedAt {
    fn updated_at(&self) -> i64;
}

impl HasId for Entry {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasUpdatedAt for Entry {
    fn updated_at(&self) -> i64 {
        self.updated_at
    }
}
