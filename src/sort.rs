//! Sorting of the record store by a chain of sort keys.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;
use tracing::debug;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::domain::VTError;
use crate::record::{Record, value_as_number, value_to_string};
use crate::schema::Column;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Header class marking a sorted column.
    pub fn class(self) -> &'static str {
        match self {
            SortDirection::Asc => "sort-asc",
            SortDirection::Desc => "sort-desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(column: usize) -> Self {
        Self { column, direction: SortDirection::Asc }
    }

    pub fn desc(column: usize) -> Self {
        Self { column, direction: SortDirection::Desc }
    }
}

/// Sort keys, primary key first. Clicking keeps this at one key; programmatic callers may
/// set a longer chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortState {
    keys: Vec<SortKey>,
}

impl SortState {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn set_keys(&mut self, keys: Vec<SortKey>) {
        self.keys = keys;
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn direction_of(&self, column: usize) -> Option<SortDirection> {
        self.keys.iter().find(|k| k.column == column).map(|k| k.direction)
    }

    /// Header click: flip the direction if `column` is the only key, otherwise sort by
    /// `column` ascending.
    pub fn toggle(&mut self, column: usize) {
        let direction = match self.keys.as_slice() {
            [only] if only.column == column => only.direction.flip(),
            _ => SortDirection::Asc,
        };
        self.keys = vec![SortKey { column, direction }];
    }
}

/// Index of the column sorted by default: keyed `id` or titled `ID`.
pub fn default_sort_column(columns: &[Column]) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.key.field_name() == Some("id") || c.title == "ID")
}

/// Compare two present values of `column`, ascending.
pub fn compare_values(a: &Value, b: &Value, ra: &Record, rb: &Record, column: &Column) -> Ordering {
    if let Some(compare) = &column.comparator {
        return compare(a, b, ra, rb);
    }

    if let (Some(x), Some(y)) = (value_as_number(a), value_as_number(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    natural_cmp(&value_to_string(a), &value_to_string(b))
}

/// Order of two records under the key chain. Missing and null values go last in both
/// directions.
pub fn compare_records(a: &Record, b: &Record, keys: &[SortKey], columns: &[Column]) -> Ordering {
    for key in keys {
        let Some(column) = columns.get(key.column) else {
            continue;
        };
        let (va, vb) = (column.value(a), column.value(b));
        let ordering = match (va.value(), vb.value()) {
            (Some(x), Some(y)) if !x.is_null() && !y.is_null() => {
                key.direction.apply(compare_values(x, y, a, b, column))
            }
            _ => match (va.is_null_like(), vb.is_null_like()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => Ordering::Equal,
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable sort of the store under `state`. Records and rows move together.
pub fn apply_sort(store: &mut RecordStore, columns: &[Column], state: &SortState) -> Result<(), VTError> {
    if state.is_empty() {
        return Ok(());
    }
    let entries = store.entries();
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&i, &j| compare_records(&entries[i].record, &entries[j].record, state.keys(), columns));
    debug!("Sorting {} records by {:?}", order.len(), state.keys());
    store.reorder(&order)
}

/// Compares base letters, ignoring case and accents, and orders digit runs by numeric value,
/// so "item2" < "item10" and "Émile" < "Eve".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (base_letters(a), base_letters(b));
    let mut ia = a.chars().peekable();
    let mut ib = b.chars().peekable();
    loop {
        let (ca, cb) = match (ia.peek(), ib.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&ca), Some(&cb)) => (ca, cb),
        };

        let ordering = if ca.is_ascii_digit() && cb.is_ascii_digit() {
            compare_digit_runs(&take_digits(&mut ia), &take_digits(&mut ib))
        } else {
            ia.next();
            ib.next();
            ca.cmp(&cb)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn base_letters(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("score", "Score"),
        ]
    }

    fn store_of(records: Vec<Record>) -> RecordStore {
        let mut store = RecordStore::new();
        store.load(records, &columns());
        store
    }

    fn ids(store: &RecordStore) -> Vec<i64> {
        store.records().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn toggle_flips_then_resets() {
        let mut state = SortState::default();
        state.toggle(1);
        assert_eq!(state.keys(), &[SortKey::asc(1)]);
        state.toggle(1);
        assert_eq!(state.keys(), &[SortKey::desc(1)]);
        state.toggle(2);
        assert_eq!(state.keys(), &[SortKey::asc(2)]);
    }

    #[test]
    fn toggle_on_multi_key_chain_replaces_it() {
        let mut state = SortState::new(vec![SortKey::desc(0), SortKey::asc(1)]);
        state.toggle(0);
        assert_eq!(state.keys(), &[SortKey::asc(0)]);
    }

    #[test]
    fn numeric_strings_sort_numerically() {
        let mut store = store_of(vec![
            json!({"id": 1, "score": "10"}),
            json!({"id": 2, "score": "9"}),
            json!({"id": 3, "score": 100}),
        ]);
        apply_sort(&mut store, &columns(), &SortState::new(vec![SortKey::asc(2)])).unwrap();
        assert_eq!(ids(&store), vec![2, 1, 3]);
    }

    #[test]
    fn missing_values_sort_last_in_both_directions() {
        let records = vec![
            json!({"id": 1, "score": 5}),
            json!({"id": 2}),
            json!({"id": 3, "score": 1}),
            json!({"id": 4, "score": null}),
            json!({"id": 5, "score": 3}),
        ];
        let mut store = store_of(records.clone());
        apply_sort(&mut store, &columns(), &SortState::new(vec![SortKey::asc(2)])).unwrap();
        assert_eq!(ids(&store), vec![3, 5, 1, 2, 4]);

        let mut store = store_of(records);
        apply_sort(&mut store, &columns(), &SortState::new(vec![SortKey::desc(2)])).unwrap();
        assert_eq!(ids(&store), vec![1, 5, 3, 2, 4]);
    }

    #[test]
    fn sort_is_stable_and_idempotent() {
        let mut store = store_of(vec![
            json!({"id": 1, "name": "b"}),
            json!({"id": 2, "name": "A"}),
            json!({"id": 3, "name": "B"}),
            json!({"id": 4, "name": "a"}),
        ]);
        let state = SortState::new(vec![SortKey::asc(1)]);
        apply_sort(&mut store, &columns(), &state).unwrap();
        assert_eq!(ids(&store), vec![2, 4, 1, 3]);
        apply_sort(&mut store, &columns(), &state).unwrap();
        assert_eq!(ids(&store), vec![2, 4, 1, 3]);
    }

    #[test]
    fn later_keys_break_ties() {
        let mut store = store_of(vec![
            json!({"id": 1, "name": "x", "score": 2}),
            json!({"id": 2, "name": "y", "score": 1}),
            json!({"id": 3, "name": "x", "score": 1}),
        ]);
        let state = SortState::new(vec![SortKey::asc(1), SortKey::desc(2)]);
        apply_sort(&mut store, &columns(), &state).unwrap();
        assert_eq!(ids(&store), vec![1, 3, 2]);
    }

    #[test]
    fn custom_comparator_is_used() {
        let by_len = vec![
            Column::new("id", "ID"),
            Column::new("name", "Name").comparator(|a, b, _, _| {
                a.as_str().map(str::len).cmp(&b.as_str().map(str::len))
            }),
        ];
        let mut store = RecordStore::new();
        store.load(
            vec![json!({"id": 1, "name": "ccc"}), json!({"id": 2, "name": "a"}), json!({"id": 3, "name": "bb"})],
            &by_len,
        );
        apply_sort(&mut store, &by_len, &SortState::new(vec![SortKey::asc(1)])).unwrap();
        assert_eq!(ids(&store), vec![2, 3, 1]);
    }

    #[test]
    fn rows_stay_aligned_after_sort() {
        let mut store = store_of(vec![json!({"id": 3}), json!({"id": 1}), json!({"id": 2})]);
        apply_sort(&mut store, &columns(), &SortState::new(vec![SortKey::desc(0)])).unwrap();
        for (i, entry) in store.entries().iter().enumerate() {
            assert_eq!(entry.row.record_index, i);
            assert_eq!(entry.row.cells[0].text, entry.record["id"].to_string());
        }
    }

    #[test]
    fn natural_order() {
        assert_eq!(natural_cmp("item2", "item10"), Ordering::Less);
        assert_eq!(natural_cmp("Apple", "apple"), Ordering::Equal);
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("b", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("ab", "abc"), Ordering::Less);
        assert_eq!(natural_cmp("Émile", "emile"), Ordering::Equal);
        assert_eq!(natural_cmp("Ångström", "angstrom"), Ordering::Equal);
    }

    #[test]
    fn accented_names_sort_by_base_letter() {
        let mut store = store_of(vec![
            json!({"id": 1, "name": "Zoe"}),
            json!({"id": 2, "name": "Émile"}),
            json!({"id": 3, "name": "Eve"}),
        ]);
        apply_sort(&mut store, &columns(), &SortState::new(vec![SortKey::asc(1)])).unwrap();
        assert_eq!(ids(&store), vec![2, 3, 1]);
    }

    #[test]
    fn default_column_is_id() {
        assert_eq!(default_sort_column(&columns()), Some(0));
        let titled = vec![Column::new("name", "Name"), Column::new("key", "ID")];
        assert_eq!(default_sort_column(&titled), Some(1));
        assert_eq!(default_sort_column(&[Column::new("name", "Name")]), None);
    }
}
