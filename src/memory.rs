// In-memory record store

use crate::record::{Record, apply_patch, now_ms};
use crate::store::RecordStore;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use std::collections::HashMap;

/// In-memory [`RecordStore`] for tests and throwaway sessions.
///
/// Records are kept as JSON documents in insertion order, so a round trip
/// through the store behaves like the durable one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<&'static str, Vec<(String, Value)>>,
    simulate_write_error: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every create/update/delete fail until turned off again
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.simulate_write_error = simulate;
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error {
            return Err(eyre!("Simulated write failure"));
        }
        Ok(())
    }

    fn docs(&self, collection: &str) -> &[(String, Value)] {
        self.collections.get(collection).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RecordStore for MemoryStore {
    fn list<T: Record>(&self) -> Result<Vec<T>> {
        self.docs(T::collection_name())
            .iter()
            .map(|(_, doc)| serde_json::from_value(doc.clone()).context("Failed to deserialize record"))
            .collect()
    }

    fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        self.docs(T::collection_name())
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(_, doc)| serde_json::from_value(doc.clone()).context("Failed to deserialize record"))
            .transpose()
    }

    fn create<T: Record>(&mut self, record: T) -> Result<String> {
        self.check_writable()?;

        let collection = T::collection_name();
        let id = record.id().to_string();
        if id.trim().is_empty() {
            return Err(eyre!("Record ID cannot be empty or whitespace-only"));
        }
        if self.docs(collection).iter().any(|(doc_id, _)| *doc_id == id) {
            return Err(eyre!("Record already exists: {}/{}", collection, id));
        }

        let doc = serde_json::to_value(&record).context("Failed to serialize record")?;
        self.collections.entry(collection).or_default().push((id.clone(), doc));
        Ok(id)
    }

    fn update<T: Record>(&mut self, id: &str, patch: &Value) -> Result<()> {
        self.check_writable()?;

        let collection = T::collection_name();
        let current = self
            .get::<T>(id)?
            .ok_or_else(|| eyre!("Record not found: {}/{}", collection, id))?;

        let mut patched = apply_patch(&current, patch)?;
        patched.touch(now_ms());
        let doc = serde_json::to_value(&patched).context("Failed to serialize record")?;

        if let Some(slot) = self
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
        {
            slot.1 = doc;
        }
        Ok(())
    }

    fn delete<T: Record>(&mut self, id: &str) -> Result<()> {
        self.check_writable()?;

        let collection = T::collection_name();
        let docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| eyre!("Record not found: {}/{}", collection, id))?;
        let pos = docs
            .iter()
            .position(|(doc_id, _)| doc_id == id)
            .ok_or_else(|| eyre!("Record not found: {}/{}", collection, id))?;
        docs.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, JobStatus};
    use serde_json::json;

    #[test]
    fn test_crud_roundtrip() {
        let mut store = MemoryStore::new();
        let job = Job::new("Engineer", "R&D", JobStatus::Open);

        let id = store.create(job.clone()).unwrap();
        assert_eq!(store.get::<Job>(&id).unwrap(), Some(job.clone()));
        assert_eq!(store.list::<Job>().unwrap().len(), 1);

        store.update::<Job>(&id, &json!({"status": "Closed"})).unwrap();
        assert_eq!(store.get::<Job>(&id).unwrap().unwrap().status, JobStatus::Closed);

        store.delete::<Job>(&id).unwrap();
        assert!(store.get::<Job>(&id).unwrap().is_none());
        assert!(store.delete::<Job>(&id).is_err());
    }

    #[test]
    fn test_simulated_write_error() {
        let mut store = MemoryStore::new();
        let job = Job::new("Engineer", "R&D", JobStatus::Open);
        let id = store.create(job.clone()).unwrap();

        store.set_simulate_write_error(true);
        assert!(store.create(Job::new("Other", "R&D", JobStatus::Open)).is_err());
        assert!(store.update::<Job>(&id, &json!({"title": "x"})).is_err());
        assert!(store.delete::<Job>(&id).is_err());

        // reads still work and nothing changed
        assert_eq!(store.list::<Job>().unwrap(), vec![job]);

        store.set_simulate_write_error(false);
        assert!(store.delete::<Job>(&id).is_ok());
    }

    #[test]
    fn test_update_missing_fails() {
        let mut store = MemoryStore::new();
        assert!(store.update::<Job>("missing", &json!({})).is_err());
        assert!(store.delete::<Job>("missing").is_err());
    }
}
