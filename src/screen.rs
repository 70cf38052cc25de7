// List screen state: load once, write through the store, patch locally on success

use crate::record::{Record, apply_patch};
use crate::store::RecordStore;
use crate::validation::{Draft, Validate, ValidationErrors};
use crate::view::{FilterDef, ListView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Everything a screen can report back to the user
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Failed to {action}: {message}")]
    Write { action: &'static str, message: String },

    #[error("Failed to load {collection}: {message}")]
    Load { collection: &'static str, message: String },
}

impl ScreenError {
    fn write(action: &'static str, report: eyre::Report) -> Self {
        ScreenError::Write {
            action,
            message: format!("{:#}", report),
        }
    }

    pub(crate) fn load(collection: &'static str, report: eyre::Report) -> Self {
        ScreenError::Load {
            collection,
            message: format!("{:#}", report),
        }
    }

    fn not_found<R: Record>(id: &str) -> Self {
        ScreenError::NotFound {
            collection: R::collection_name(),
            id: id.to_string(),
        }
    }
}

/// One list screen: the view state plus the write path that keeps it in step with the store.
///
/// Writes are sent one at a time. The local collection is only patched after the
/// store accepted the write, so a failed write leaves the view exactly as it was.
/// Nothing is retried and the collection is never re-fetched behind the caller's back.
#[derive(Debug)]
pub struct Screen<R> {
    view: ListView<R>,
}

impl<R: Record> Screen<R> {
    /// Screen with no data yet; `view().is_loaded()` is false until `load`
    pub fn new(defs: Vec<FilterDef<R>>, page_size: NonZeroUsize) -> Self {
        Self {
            view: ListView::new(defs, page_size),
        }
    }

    /// Enter the screen: build it and load the collection once
    pub fn enter<S: RecordStore>(
        store: &S,
        defs: Vec<FilterDef<R>>,
        page_size: NonZeroUsize,
    ) -> Result<Self, ScreenError> {
        let mut screen = Self::new(defs, page_size);
        screen.load(store)?;
        Ok(screen)
    }

    pub fn load<S: RecordStore>(&mut self, store: &S) -> Result<(), ScreenError> {
        let records = store
            .list::<R>()
            .map_err(|e| ScreenError::load(R::collection_name(), e))?;
        self.view.load_collection(records);
        Ok(())
    }

    pub fn view(&self) -> &ListView<R> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ListView<R> {
        &mut self.view
    }

    /// Fetch one record for a detail screen
    pub fn detail<S: RecordStore>(store: &S, id: &str) -> Result<R, ScreenError> {
        store
            .get::<R>(id)
            .map_err(|e| ScreenError::load(R::collection_name(), e))?
            .ok_or_else(|| ScreenError::not_found::<R>(id))
    }

    /// Validate a draft, store it, then show it
    pub fn create<S, D>(&mut self, store: &mut S, draft: D, now: DateTime<Utc>) -> Result<String, ScreenError>
    where
        S: RecordStore,
        D: Draft<Output = R>,
    {
        let record = draft.validate(now)?;

        let id = store
            .create(record.clone())
            .map_err(|e| ScreenError::write("create record", e))?;

        info!(collection = R::collection_name(), id = %id, "create: stored, inserting locally");
        self.view.insert(record);
        Ok(id)
    }

    /// Validate a partial update, send it, then take the stored version into the view
    pub fn update<S, P>(&mut self, store: &mut S, id: &str, patch: &P, now: DateTime<Utc>) -> Result<(), ScreenError>
    where
        S: RecordStore,
        P: Validate + Serialize,
    {
        patch.validate(now)?;

        let changes = serde_json::to_value(patch).map_err(|e| ScreenError::write("encode update", e.into()))?;

        if store
            .get::<R>(id)
            .map_err(|e| ScreenError::load(R::collection_name(), e))?
            .is_none()
        {
            return Err(ScreenError::not_found::<R>(id));
        }

        store
            .update::<R>(id, &changes)
            .map_err(|e| ScreenError::write("update record", e))?;

        self.reconcile_update(store, id, &changes);
        Ok(())
    }

    /// Delete a record and drop it from the view.
    ///
    /// Confirmation is the caller's job.
    pub fn delete<S: RecordStore>(&mut self, store: &mut S, id: &str) -> Result<(), ScreenError> {
        if store
            .get::<R>(id)
            .map_err(|e| ScreenError::load(R::collection_name(), e))?
            .is_none()
        {
            return Err(ScreenError::not_found::<R>(id));
        }

        store
            .delete::<R>(id)
            .map_err(|e| ScreenError::write("delete record", e))?;

        info!(collection = R::collection_name(), id, "delete: removed, dropping locally");
        self.view.remove(id);
        Ok(())
    }

    /// Bring the local copy in line with an accepted update.
    ///
    /// The store stamps `updated_at` itself, so the stored version is read back and
    /// replaces the local one. Only if that read fails is the patch merged locally.
    fn reconcile_update<S: RecordStore>(&mut self, store: &S, id: &str, changes: &serde_json::Value) {
        match store.get::<R>(id) {
            Ok(Some(stored)) => {
                self.view.replace(stored);
            }
            Ok(None) => {
                self.view.remove(id);
            }
            Err(e) => {
                warn!(id, error = %e, "reconcile_update: read back failed, merging locally");
                let Some(current) = self.view.get(id) else {
                    debug!(id, "reconcile_update: record not loaded locally");
                    return;
                };
                match apply_patch(current, changes) {
                    Ok(patched) => {
                        self.view.replace(patched);
                    }
                    Err(e) => warn!(id, error = %e, "reconcile_update: local merge failed"),
                }
            }
        }
    }
}
