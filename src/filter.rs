//! Column filters and free text search.
//!
//! Filtering never removes rows. It classifies every row as passing or hidden, and the page
//! window only counts rows that pass.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::record::{CellValue, Record};
use crate::schema::Column;
use crate::store::{Entry, RecordStore};

pub type Predicate = Arc<dyn Fn(&CellValue, &Record) -> bool + Send + Sync>;

/// A rule that a column value must satisfy.
#[derive(Clone)]
pub enum FilterSpec {
    Exact(Value),
    OneOf(Vec<Value>),
    Predicate(Predicate),
}

impl FilterSpec {
    pub fn predicate(f: impl Fn(&CellValue, &Record) -> bool + Send + Sync + 'static) -> Self {
        FilterSpec::Predicate(Arc::new(f))
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FilterSpec::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, value: &CellValue, record: &Record) -> bool {
        match self {
            FilterSpec::Predicate(f) => f(value, record),
            FilterSpec::OneOf(allowed) => match value.value() {
                Some(v) => allowed.iter().any(|a| same_value(a, v)),
                None => false,
            },
            FilterSpec::Exact(expected) => match value.value() {
                Some(v) => same_value(expected, v),
                None => false,
            },
        }
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Exact(v) => f.debug_tuple("Exact").field(v).finish(),
            FilterSpec::OneOf(vs) => f.debug_tuple("OneOf").field(vs).finish(),
            FilterSpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// Numbers compare by value, so 1 and 1.0 are the same.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Filters keyed by column field, evaluated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilters(Vec<(String, FilterSpec)>);

impl ColumnFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ColumnFilters::insert`].
    pub fn with(mut self, key: impl Into<String>, spec: FilterSpec) -> Self {
        self.insert(key, spec);
        self
    }

    /// Set the filter for `key`. Replacing an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, spec: FilterSpec) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = spec,
            None => self.0.push((key, spec)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.0.iter().map(|(k, s)| (k.as_str(), s))
    }
}

impl<K: Into<String>> FromIterator<(K, FilterSpec)> for ColumnFilters {
    fn from_iter<T: IntoIterator<Item = (K, FilterSpec)>>(iter: T) -> Self {
        let mut filters = ColumnFilters::new();
        for (k, spec) in iter {
            filters.insert(k, spec);
        }
        filters
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// Always stored lower-cased.
    search_query: String,
    column_filters: ColumnFilters,
}

impl FilterState {
    pub fn new(column_filters: ColumnFilters) -> Self {
        Self {
            search_query: String::new(),
            column_filters,
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_lowercase();
    }

    pub fn column_filters(&self) -> &ColumnFilters {
        &self.column_filters
    }

    pub fn set_column_filters(&mut self, filters: ColumnFilters) {
        self.column_filters = filters;
    }

    pub fn is_active(&self) -> bool {
        !self.search_query.is_empty() || !self.column_filters.is_empty()
    }

    pub fn reset(&mut self) {
        self.search_query.clear();
        self.column_filters = ColumnFilters::new();
    }

    /// Column filters first, stopping at the first failure, then the search query.
    pub fn passes(&self, record: &Record, columns: &[Column]) -> bool {
        for (key, spec) in self.column_filters.iter() {
            let Some(column) = columns.iter().find(|c| c.key.field_name() == Some(key)) else {
                continue;
            };
            if !spec.matches(&column.value(record), record) {
                return false;
            }
        }

        if self.search_query.is_empty() {
            return true;
        }
        columns.iter().any(|column| {
            let value = column.value(record);
            !value.is_null_like() && value.display().to_lowercase().contains(&self.search_query)
        })
    }
}

/// Filter classification of every entry, in store order.
pub fn classify(entries: &[Entry], columns: &[Column], state: &FilterState) -> Vec<bool> {
    if !state.is_active() {
        return vec![true; entries.len()];
    }
    entries
        .iter()
        .map(|entry| state.passes(&entry.record, columns))
        .collect()
}

/// Reclassify every row against the current filter state.
pub fn recompute_visibility(store: &mut RecordStore, columns: &[Column], state: &FilterState) {
    let flags = classify(store.entries(), columns, state);
    let mut passing = 0;
    for (row, passes) in store.rows_mut().zip(flags) {
        row.passes_filter = passes;
        if passes {
            passing += 1;
        }
    }
    debug!(
        "Filter '{}' with {} column filters: {}/{} rows pass",
        state.search_query(),
        state.column_filters().len(),
        passing,
        store.len()
    );
}

/// Drop the search query and all column filters, and mark every row as passing.
pub fn clear(store: &mut RecordStore, state: &mut FilterState) {
    state.reset();
    store.rows_mut().for_each(|row| row.passes_filter = true);
    trace!("Cleared filters on {} rows", store.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("status", "Status"),
            Column::new("meta.city", "City"),
        ]
    }

    fn records() -> Vec<Record> {
        vec![
            json!({"id": 1, "name": "Alice", "status": "active", "meta": {"city": "Oslo"}}),
            json!({"id": 2, "name": "Bob", "status": "pending", "meta": {"city": "Bergen"}}),
            json!({"id": 3, "name": "Carol", "status": "banned"}),
            json!({"id": 4, "name": null, "status": "active", "meta": {"city": "Molde"}}),
        ]
    }

    fn passing(state: &FilterState) -> Vec<i64> {
        records()
            .iter()
            .filter(|r| state.passes(r, &columns()))
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut state = FilterState::default();
        state.set_search_query("OSL");
        assert_eq!(state.search_query(), "osl");
        assert_eq!(passing(&state), vec![1]);

        state.set_search_query("b");
        assert_eq!(passing(&state), vec![2, 3]);
    }

    #[test]
    fn null_values_never_match_search() {
        let mut state = FilterState::default();
        state.set_search_query("null");
        assert!(passing(&state).is_empty());
    }

    #[test]
    fn one_of_and_exact_filters() {
        let state = FilterState::new(
            ColumnFilters::new().with("status", FilterSpec::one_of(["active", "pending"])),
        );
        assert_eq!(passing(&state), vec![1, 2, 4]);

        let state = FilterState::new(ColumnFilters::new().with("id", FilterSpec::Exact(json!(2.0))));
        assert_eq!(passing(&state), vec![2]);
    }

    #[test]
    fn predicate_filter_sees_missing_values() {
        let state = FilterState::new(
            ColumnFilters::new().with("meta.city", FilterSpec::predicate(|v, _| v.is_missing())),
        );
        assert_eq!(passing(&state), vec![3]);
    }

    #[test]
    fn unknown_filter_key_is_skipped() {
        let state = FilterState::new(
            ColumnFilters::new()
                .with("nope", FilterSpec::Exact(json!("x")))
                .with("status", FilterSpec::Exact(json!("active"))),
        );
        assert_eq!(passing(&state), vec![1, 4]);
    }

    #[test]
    fn filters_and_search_compose() {
        let mut state = FilterState::new(
            ColumnFilters::new().with("status", FilterSpec::Exact(json!("active"))),
        );
        state.set_search_query("mol");
        assert_eq!(passing(&state), vec![4]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut filters = ColumnFilters::new()
            .with("a", FilterSpec::Exact(json!(1)))
            .with("b", FilterSpec::Exact(json!(2)));
        filters.insert("a", FilterSpec::Exact(json!(3)));
        let keys: Vec<&str> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn recompute_and_clear_rows() {
        let mut store = RecordStore::new();
        store.load(records(), &columns());
        let mut state = FilterState::default();
        state.set_search_query("bob");
        recompute_visibility(&mut store, &columns(), &state);
        let flags: Vec<bool> = store.rows().map(|r| r.passes_filter).collect();
        assert_eq!(flags, vec![false, true, false, false]);
        assert!(store.rows().next().unwrap().hidden_by_filter());

        clear(&mut store, &mut state);
        assert!(!state.is_active());
        assert!(store.rows().all(|r| r.passes_filter));
    }
}
