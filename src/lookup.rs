// Resolve foreign ids to display labels

use crate::record::Record;
use std::collections::HashMap;

/// Label for `id` from `collection`, or the raw id when nothing matches or the label is blank.
///
/// A dangling reference shows up as its id instead of failing the whole view.
pub fn lookup<R, F>(collection: &[R], id: &str, label: F) -> String
where
    R: Record,
    F: Fn(&R) -> &str,
{
    collection
        .iter()
        .find(|r| r.id() == id)
        .map(label)
        .filter(|l| !l.is_empty())
        .unwrap_or(id)
        .to_string()
}

/// Prebuilt id -> label index for repeated lookups against one collection.
///
/// Records with a blank label are left out, so they resolve like dangling ids.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    by_id: HashMap<String, String>,
}

impl Labels {
    pub fn build<R, F>(collection: &[R], label: F) -> Self
    where
        R: Record,
        F: Fn(&R) -> &str,
    {
        let by_id = collection
            .iter()
            .filter(|r| !label(*r).is_empty())
            .map(|r| (r.id().to_string(), label(r).to_string()))
            .collect();
        Self { by_id }
    }

    /// Label for `id`, falling back to the id itself
    pub fn get(&self, id: &str) -> String {
        self.by_id.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    /// Label for `id` only when the reference resolves
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
