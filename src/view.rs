// List view engine: filter, paginate, and keep page state consistent

use crate::filter::{Accessor, FilterKind, Predicate, all_match};
use crate::record::{FieldValue, Record};
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Rows per page on every list screen unless configured otherwise
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => panic!("page size must be non-zero"),
};

/// A named filter a screen offers: how to compare, and what to compare against
#[derive(Debug, Clone)]
pub struct FilterDef<R> {
    pub name: String,
    pub kind: FilterKind,
    pub accessor: Accessor<R>,
}

impl<R> FilterDef<R> {
    pub fn new(name: impl Into<String>, kind: FilterKind, accessor: Accessor<R>) -> Self {
        Self {
            name: name.into(),
            kind,
            accessor,
        }
    }
}

/// Active filter values by filter name. Absent means "not applied".
pub type FilterSet = BTreeMap<String, String>;

/// One page of the filtered collection
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a, R> {
    pub items: Vec<&'a R>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<R> PageSlice<'_, R> {
    /// Pagination controls are only needed when there is more than one page
    pub fn show_pagination(&self) -> bool {
        self.total_pages > 1
    }
}

/// Order-preserving selection of the records that pass every active filter
pub fn apply_filters<'a, R>(collection: &'a [R], defs: &[FilterDef<R>], filters: &FilterSet) -> Vec<&'a R> {
    matching_indices(collection, defs, filters)
        .into_iter()
        .map(|i| &collection[i])
        .collect()
}

fn matching_indices<R>(collection: &[R], defs: &[FilterDef<R>], filters: &FilterSet) -> Vec<usize> {
    let predicates: Vec<Predicate<R>> = defs
        .iter()
        .filter_map(|def| {
            filters
                .get(&def.name)
                .map(|value| Predicate::new(def.kind, def.accessor.clone(), value.clone()))
        })
        .filter(|p| p.is_active())
        .collect();

    collection
        .iter()
        .enumerate()
        .filter(|(_, record)| all_match(&predicates, record))
        .map(|(i, _)| i)
        .collect()
}

/// View state for one list screen.
///
/// The filtered index list is derived state: it is only ever rebuilt by `recompute`,
/// which every mutation of the collection or the filter set goes through, and every
/// such mutation also puts the page back to 1.
#[derive(Debug)]
pub struct ListView<R> {
    collection: Vec<R>,
    defs: Vec<FilterDef<R>>,
    filters: FilterSet,
    page: usize,
    page_size: NonZeroUsize,
    filtered: Vec<usize>,
    loaded: bool,
}

impl<R: Record> ListView<R> {
    pub fn new(defs: Vec<FilterDef<R>>, page_size: NonZeroUsize) -> Self {
        Self {
            collection: Vec::new(),
            defs,
            filters: FilterSet::new(),
            page: 1,
            page_size,
            filtered: Vec::new(),
            loaded: false,
        }
    }

    /// Replace the full collection (screen entry)
    pub fn load_collection(&mut self, records: Vec<R>) {
        debug!(
            collection = R::collection_name(),
            count = records.len(),
            "load_collection: called"
        );
        self.collection = records;
        self.loaded = true;
        self.recompute();
    }

    /// False until the first collection load completes; render a loading state until then
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Set or clear (empty value) a filter. Unknown filter names are ignored.
    ///
    /// Returns whether the name was known.
    pub fn set_filter(&mut self, name: &str, value: impl Into<String>) -> bool {
        if !self.defs.iter().any(|d| d.name == name) {
            warn!(filter = name, "set_filter: unknown filter, ignoring");
            return false;
        }

        let value = value.into();
        if value.is_empty() {
            self.filters.remove(name);
        } else {
            self.filters.insert(name.to_string(), value);
        }
        self.recompute();
        true
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.recompute();
    }

    /// Swap in a new definition for a filter (or add one).
    ///
    /// Used when an accessor depends on another collection that was reloaded.
    pub fn replace_filter(&mut self, def: FilterDef<R>) {
        match self.defs.iter_mut().find(|d| d.name == def.name) {
            Some(existing) => *existing = def,
            None => self.defs.push(def),
        }
        self.recompute();
    }

    /// Move to page `n`, clamped into `[1, total_pages]` (or 1 when there are no pages)
    pub fn set_page(&mut self, n: usize) {
        self.page = n.clamp(1, self.total_pages().max(1));
    }

    pub fn current_slice(&self) -> PageSlice<'_, R> {
        let size = self.page_size.get();
        let start = (self.page - 1) * size;
        let items = self
            .filtered
            .iter()
            .skip(start)
            .take(size)
            .map(|&i| &self.collection[i])
            .collect();

        PageSlice {
            items,
            page: self.page,
            total_pages: self.total_pages(),
            total_items: self.filtered.len(),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size.get())
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filter_value(&self, name: &str) -> &str {
        self.filters.get(name).map(String::as_str).unwrap_or("")
    }

    /// Applied filters as (name, comparison, value), in definition order
    pub fn active_filters(&self) -> Vec<(&str, FilterKind, &str)> {
        self.defs
            .iter()
            .filter_map(|d| {
                self.filters
                    .get(&d.name)
                    .map(|value| (d.name.as_str(), d.kind, value.as_str()))
            })
            .collect()
    }

    pub fn collection(&self) -> &[R] {
        &self.collection
    }

    /// Records that pass the active filters, in collection order
    pub fn filtered(&self) -> Vec<&R> {
        self.filtered.iter().map(|&i| &self.collection[i]).collect()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.collection.iter().find(|r| r.id() == id)
    }

    /// Distinct non-empty values of a filter's field across the full collection,
    /// in first-seen order. These are the options offered for an equals filter.
    pub fn facet(&self, name: &str) -> Vec<String> {
        let Some(def) = self.defs.iter().find(|d| d.name == name) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for record in &self.collection {
            let found = match def.accessor.get(record) {
                Some(FieldValue::Tags(tags)) => tags,
                Some(other) => vec![other.to_string()],
                None => continue,
            };
            for value in found {
                if !value.is_empty() && seen.insert(value.clone()) {
                    values.push(value);
                }
            }
        }
        values
    }

    // ========================================================================
    // Local patches (applied after a successful write)
    // ========================================================================

    /// Add a newly created record at the front of the collection
    pub fn insert(&mut self, record: R) {
        self.collection.insert(0, record);
        self.recompute();
    }

    /// Replace the record with the same id. Returns false if it is not loaded.
    pub fn replace(&mut self, record: R) -> bool {
        let Some(slot) = self.collection.iter_mut().find(|r| r.id() == record.id()) else {
            return false;
        };
        *slot = record;
        self.recompute();
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<R> {
        let pos = self.collection.iter().position(|r| r.id() == id)?;
        let removed = self.collection.remove(pos);
        self.recompute();
        Some(removed)
    }

    /// The single place derived state is rebuilt
    fn recompute(&mut self) {
        self.filtered = matching_indices(&self.collection, &self.defs, &self.filters);
        self.page = 1;
        debug!(
            collection = R::collection_name(),
            total = self.collection.len(),
            matched = self.filtered.len(),
            active_filters = self.filters.len(),
            "recompute: done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Item {
        id: String,
        title: String,
        status: String,
        updated_at: i64,
    }

    impl Record for Item {
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
            "items"
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "title" => FieldValue::text(&self.title),
                "status" => FieldValue::text(&self.status),
                _ => None,
            }
        }
    }

    fn item(n: usize, status: &str) -> Item {
        Item {
            id: format!("job-{}", n),
            title: format!("Job {}", n),
            status: status.to_string(),
            updated_at: 1000,
        }
    }

    /// Seven jobs, 2 and 5 closed
    fn seven_jobs() -> Vec<Item> {
        (1..=7)
            .map(|n| item(n, if n == 2 || n == 5 { "Closed" } else { "Open" }))
            .collect()
    }

    fn defs() -> Vec<FilterDef<Item>> {
        vec![
            FilterDef::new("search", FilterKind::TextContains, Accessor::field("title")),
            FilterDef::new("status", FilterKind::Equals, Accessor::field("status")),
        ]
    }

    fn view() -> ListView<Item> {
        let mut view = ListView::new(defs(), DEFAULT_PAGE_SIZE);
        view.load_collection(seven_jobs());
        view
    }

    fn ids(slice: &PageSlice<'_, Item>) -> Vec<String> {
        slice.items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_empty_filters_are_identity() {
        let jobs = seven_jobs();
        let mut filters = FilterSet::new();
        assert_eq!(apply_filters(&jobs, &defs(), &filters).len(), 7);

        filters.insert("search".to_string(), String::new());
        filters.insert("status".to_string(), String::new());
        let filtered = apply_filters(&jobs, &defs(), &filters);
        assert_eq!(filtered, jobs.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_filtering_preserves_order_and_is_idempotent() {
        let jobs = seven_jobs();
        let mut filters = FilterSet::new();
        filters.insert("status".to_string(), "Open".to_string());

        let first = apply_filters(&jobs, &defs(), &filters);
        let second = apply_filters(&jobs, &defs(), &filters);
        assert_eq!(first, second);

        let positions: Vec<usize> = first
            .iter()
            .map(|r| jobs.iter().position(|j| j.id == r.id).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert_eq!(positions, vec![0, 2, 3, 5, 6]);
    }

    #[test]
    fn test_unknown_filter_names_in_set_are_ignored() {
        let jobs = seven_jobs();
        let mut filters = FilterSet::new();
        filters.insert("salary".to_string(), "lots".to_string());
        assert_eq!(apply_filters(&jobs, &defs(), &filters).len(), 7);
    }

    #[test]
    fn test_seven_jobs_two_pages() {
        let mut view = view();

        let slice = view.current_slice();
        assert_eq!(ids(&slice), vec!["job-1", "job-2", "job-3", "job-4", "job-5"]);
        assert_eq!(slice.total_pages, 2);
        assert_eq!(slice.page, 1);
        assert!(slice.show_pagination());

        view.set_page(2);
        let slice = view.current_slice();
        assert_eq!(ids(&slice), vec!["job-6", "job-7"]);
        assert_eq!(slice.page, 2);
    }

    #[test]
    fn test_status_filter_collapses_to_one_page() {
        let mut view = view();
        view.set_page(2);

        assert!(view.set_filter("status", "Closed"));
        let slice = view.current_slice();
        assert_eq!(ids(&slice), vec!["job-2", "job-5"]);
        assert_eq!(slice.total_pages, 1);
        assert_eq!(slice.page, 1);
        assert!(!slice.show_pagination());
    }

    #[test]
    fn test_set_page_clamps() {
        let mut view = view();
        for n in [0, 1, 2, 3, 100, usize::MAX] {
            view.set_page(n);
            let page = view.current_slice().page;
            assert!((1..=2).contains(&page), "page {} out of range for n = {}", page, n);
        }

        view.set_page(0);
        assert_eq!(view.page(), 1);
        view.set_page(99);
        assert_eq!(view.page(), 2);
    }

    #[test]
    fn test_filter_change_resets_page_even_when_page_still_exists() {
        let mut view = view();
        view.set_page(2);
        // "Job" matches all seven, page 2 would still exist
        view.set_filter("search", "job");
        assert_eq!(view.page(), 1);
        assert_eq!(view.total_pages(), 2);
    }

    #[test]
    fn test_unknown_filter_is_ignored() {
        let mut view = view();
        view.set_page(2);
        assert!(!view.set_filter("salary", "lots"));
        assert_eq!(view.page(), 2);
        assert!(view.filters().is_empty());
    }

    #[test]
    fn test_active_filters_follow_definition_order() {
        let mut view = view();
        assert!(view.active_filters().is_empty());

        view.set_filter("status", "Open");
        view.set_filter("search", "job");
        let summary: Vec<String> = view
            .active_filters()
            .into_iter()
            .map(|(name, kind, value)| format!("{} {} {}", name, kind, value))
            .collect();
        assert_eq!(summary, vec!["search contains job", "status = Open"]);
    }

    #[test]
    fn test_clearing_a_filter_removes_it() {
        let mut view = view();
        view.set_filter("status", "Closed");
        assert_eq!(view.filter_value("status"), "Closed");

        view.set_filter("status", "");
        assert_eq!(view.filter_value("status"), "");
        assert_eq!(view.current_slice().total_items, 7);

        view.set_filter("search", "1");
        view.clear_filters();
        assert!(view.filters().is_empty());
        assert_eq!(view.filtered().len(), 7);
    }

    #[test]
    fn test_empty_collection() {
        let mut view: ListView<Item> = ListView::new(defs(), DEFAULT_PAGE_SIZE);
        assert!(!view.is_loaded());
        view.load_collection(Vec::new());
        assert!(view.is_loaded());

        view.set_page(5);
        let slice = view.current_slice();
        assert!(slice.items.is_empty());
        assert_eq!(slice.total_pages, 0);
        assert_eq!(slice.page, 1);
        assert!(!slice.show_pagination());
    }

    #[test]
    fn test_local_patches_recompute_and_reset() {
        let mut view = view();
        view.set_filter("status", "Open");
        assert_eq!(view.current_slice().total_items, 5);

        view.set_page(1);
        assert!(view.remove("job-1").is_some());
        assert_eq!(view.current_slice().total_items, 4);
        assert!(view.remove("job-1").is_none());

        let mut closed = item(3, "Closed");
        closed.title = "Job 3 (filled)".to_string();
        assert!(view.replace(closed));
        assert_eq!(view.current_slice().total_items, 3);
        assert_eq!(view.get("job-3").unwrap().title, "Job 3 (filled)");
        assert!(!view.replace(item(42, "Open")));

        view.insert(item(8, "Open"));
        let slice = view.current_slice();
        assert_eq!(slice.items[0].id, "job-8");
        assert_eq!(slice.total_items, 4);
        assert_eq!(slice.page, 1);
    }

    #[test]
    fn test_load_resets_page() {
        let mut view = view();
        view.set_page(2);
        view.load_collection(seven_jobs());
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_replace_filter_recomputes() {
        let mut view = view();
        view.set_filter("search", "open");
        assert_eq!(view.current_slice().total_items, 0);

        // search the status instead of the title
        view.replace_filter(FilterDef::new(
            "search",
            FilterKind::TextContains,
            Accessor::field("status"),
        ));
        assert_eq!(view.current_slice().total_items, 5);
    }

    #[test]
    fn test_facet_is_distinct_in_first_seen_order() {
        let view = view();
        assert_eq!(view.facet("status"), vec!["Open", "Closed"]);
        assert!(view.facet("missing").is_empty());
    }

    #[test]
    fn test_page_size_one() {
        let mut view = ListView::new(defs(), NonZeroUsize::new(1).unwrap());
        view.load_collection(seven_jobs());
        assert_eq!(view.total_pages(), 7);
        view.set_page(7);
        assert_eq!(ids(&view.current_slice()), vec!["job-7"]);
    }
}
