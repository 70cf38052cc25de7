// Record predicates for list filtering

use crate::record::{FieldValue, Record};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Caller-supplied field accessor.
///
/// Most accessors read a named field through [`Record::field`], but any closure works,
/// e.g. one that resolves a foreign id to a label from another collection.
pub struct Accessor<R> {
    get: Arc<dyn Fn(&R) -> Option<FieldValue> + Send + Sync>,
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        Self { get: Arc::clone(&self.get) }
    }
}

impl<R> Accessor<R> {
    pub fn new<F>(get: F) -> Self
    where
        F: Fn(&R) -> Option<FieldValue> + Send + Sync + 'static,
    {
        Self { get: Arc::new(get) }
    }

    pub fn get(&self, record: &R) -> Option<FieldValue> {
        (self.get)(record)
    }
}

impl<R: Record> Accessor<R> {
    /// Accessor that reads `name` via [`Record::field`]
    pub fn field(name: &'static str) -> Self {
        Self::new(move |record: &R| record.field(name))
    }
}

impl<R> std::fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Accessor(..)")
    }
}

/// How a filter value is compared against a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    TextContains, // case-insensitive substring
    Equals,       // exact match
    DateEquals,   // same UTC calendar day
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::TextContains => write!(f, "contains"),
            FilterKind::Equals => write!(f, "="),
            FilterKind::DateEquals => write!(f, "on"),
        }
    }
}

/// A single filter bound to its current value.
///
/// An empty value makes the predicate vacuously true.
#[derive(Debug, Clone)]
pub struct Predicate<R> {
    kind: FilterKind,
    accessor: Accessor<R>,
    value: String,
    // lowercased query for TextContains, parsed day for DateEquals
    needle: String,
    day: Option<NaiveDate>,
}

impl<R> Predicate<R> {
    pub fn new(kind: FilterKind, accessor: Accessor<R>, value: impl Into<String>) -> Self {
        let value = value.into();
        let needle = match kind {
            FilterKind::TextContains => value.to_lowercase(),
            _ => String::new(),
        };
        let day = match kind {
            FilterKind::DateEquals => NaiveDate::parse_from_str(&value, "%Y-%m-%d").ok(),
            _ => None,
        };
        Self {
            kind,
            accessor,
            value,
            needle,
            day,
        }
    }

    pub fn text_contains(accessor: Accessor<R>, query: impl Into<String>) -> Self {
        Self::new(FilterKind::TextContains, accessor, query)
    }

    pub fn equals(accessor: Accessor<R>, value: impl Into<String>) -> Self {
        Self::new(FilterKind::Equals, accessor, value)
    }

    pub fn date_equals(accessor: Accessor<R>, iso_date: impl Into<String>) -> Self {
        Self::new(FilterKind::DateEquals, accessor, iso_date)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this predicate actually constrains anything
    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn matches(&self, record: &R) -> bool {
        if !self.is_active() {
            return true;
        }

        let field = self.accessor.get(record);
        match self.kind {
            FilterKind::TextContains => {
                let haystack = field.map(|v| v.to_string()).unwrap_or_default();
                haystack.to_lowercase().contains(&self.needle)
            }
            FilterKind::Equals => match field {
                Some(FieldValue::Tags(tags)) => tags.iter().any(|t| *t == self.value),
                Some(other) => other.to_string() == self.value,
                None => false,
            },
            FilterKind::DateEquals => match (self.day, field.as_ref().and_then(calendar_day)) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => false,
            },
        }
    }
}

/// AND-composition of predicates
pub fn all_match<R>(predicates: &[Predicate<R>], record: &R) -> bool {
    predicates.iter().all(|p| p.matches(record))
}

/// UTC calendar day of a timestamp-like field; time of day is discarded
fn calendar_day(value: &FieldValue) -> Option<NaiveDate> {
    match value {
        FieldValue::Time(t) => Some(t.date_naive()),
        FieldValue::Text(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc).date_naive())
            .ok()
            .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())),
        _ => None,
    }
}
