// Generic record trait for jobs, candidates, interviews and users

use chrono::{DateTime, SecondsFormat, Utc};
use eyre::{Context, Result, eyre};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Unique, immutable identifier for this record
    fn id(&self) -> &str;

    /// Timestamp when this record was last written (milliseconds since epoch)
    fn updated_at(&self) -> i64;

    /// Stamp the record as written at `now_ms`
    fn touch(&mut self, now_ms: i64);

    /// Collection name for this record type (e.g., "jobs", "candidates")
    /// Determines the JSONL filename: {collection}.jsonl
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Named field accessor used by list filters.
    /// Returns None for unknown or unset fields.
    fn field(&self, _name: &str) -> Option<FieldValue> {
        None
    }
}

/// Value of a named record field as seen by filters and renderers
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Tags(Vec<String>),
}

impl FieldValue {
    /// Optional text fields that are present but blank count as unset
    pub fn text(value: &str) -> Option<FieldValue> {
        if value.is_empty() {
            None
        } else {
            Some(FieldValue::Text(value.to_string()))
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Time(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            FieldValue::Tags(tags) => write!(f, "{}", tags.join(", ")),
        }
    }
}

/// Fresh record identifier (UUIDv7, so ids sort by creation time)
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Current wall clock in milliseconds since epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Merge a partial record onto a full one.
///
/// Top-level keys in `patch` replace the record's keys and `null` removes the key.
/// The merged document must still deserialize as `T` and keep the original id.
/// Both stores merge updates through here, and screens fall back to it when the
/// stored version cannot be read back.
pub fn apply_patch<T: Record>(record: &T, patch: &Value) -> Result<T> {
    let changes = patch
        .as_object()
        .ok_or_else(|| eyre!("Patch must be a JSON object, got: {}", patch))?;

    let mut doc = serde_json::to_value(record).context("Failed to serialize record")?;
    let fields = doc
        .as_object_mut()
        .ok_or_else(|| eyre!("Record {} did not serialize to a JSON object", record.id()))?;

    for (key, value) in changes {
        if value.is_null() {
            fields.remove(key);
        } else {
            fields.insert(key.clone(), value.clone());
        }
    }

    let patched: T = serde_json::from_value(doc).context("Patched record no longer matches its type")?;
    if patched.id() != record.id() {
        return Err(eyre!(
            "Record ID cannot be changed by a patch: {} -> {}",
            record.id(),
            patched.id()
        ));
    }

    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        updated_at: i64,
    }

    impl Record for TestRecord {
        fn id(&self) -> &str {
            &self.id
        }

        fn updated_at(&self) -> i64 {
            self.updated_at
        }

        fn touch(&mut self, now_ms: i64) {
            self.updated_at = now_ms;
        }

        fn collection_name() -> &'static str {
            "test"
        }
    }

    fn sample() -> TestRecord {
        TestRecord {
            id: "test-1".to_string(),
            name: "Test".to_string(),
            note: Some("keep".to_string()),
            updated_at: 1000,
        }
    }

    #[test]
    fn test_record_trait_implementation() {
        let mut record = sample();

        assert_eq!(record.id(), "test-1");
        assert_eq!(record.updated_at(), 1000);
        assert_eq!(TestRecord::collection_name(), "test");
        assert!(record.field("name").is_none());

        record.touch(2000);
        assert_eq!(record.updated_at(), 2000);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Text("test".to_string()).to_string(), "test");
        assert_eq!(FieldValue::Int(42).to_string(), "42");
        assert_eq!(FieldValue::Float(4.5).to_string(), "4.5");
        assert_eq!(
            FieldValue::Tags(vec!["rust".to_string(), "sql".to_string()]).to_string(),
            "rust, sql"
        );

        let t = DateTime::parse_from_rfc3339("2024-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(FieldValue::Time(t).to_string(), "2024-03-01T09:30:00Z");
    }

    #[test]
    fn test_blank_text_is_unset() {
        assert!(FieldValue::text("").is_none());
        assert_eq!(FieldValue::text("x"), Some(FieldValue::Text("x".to_string())));
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
        assert!(now_ms() > 1_600_000_000_000);
    }

    #[test]
    fn test_apply_patch_replaces_and_keeps_other_fields() {
        let patched = apply_patch(&sample(), &json!({"name": "Renamed"})).unwrap();
        assert_eq!(patched.name, "Renamed");
        assert_eq!(patched.note.as_deref(), Some("keep"));
        assert_eq!(patched.updated_at, 1000);
    }

    #[test]
    fn test_apply_patch_null_removes_optional_field() {
        let patched = apply_patch(&sample(), &json!({"note": null})).unwrap();
        assert!(patched.note.is_none());
    }

    #[test]
    fn test_apply_patch_rejects_id_change() {
        assert!(apply_patch(&sample(), &json!({"id": "other"})).is_err());
    }

    #[test]
    fn test_apply_patch_rejects_type_mismatch() {
        assert!(apply_patch(&sample(), &json!({"name": 7})).is_err());
        assert!(apply_patch(&sample(), &json!({"name": null})).is_err());
        assert!(apply_patch(&sample(), &json!(["not", "an", "object"])).is_err());
    }
}
