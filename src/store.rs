//! The record store: records paired with their display rows.
//!
//! Records and rows live together in one ordered collection of entries, so reordering
//! moves both at once and `rows[i].record_index == i` holds after every change.

use tracing::trace;

use crate::domain::VTError;
use crate::record::Record;
use crate::schema::Column;

/// Zebra parity of a displayed row. The first displayed row is `Odd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stripe {
    Odd,
    Even,
}

impl Stripe {
    pub fn for_position(position: usize) -> Self {
        if position % 2 == 0 { Stripe::Odd } else { Stripe::Even }
    }

    pub fn class(self) -> &'static str {
        match self {
            Stripe::Odd => "odd",
            Stripe::Even => "even",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    pub text: String,
    pub class_names: Option<String>,
}

/// Display token of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RowHandle {
    pub record_index: usize,
    pub cells: Vec<RenderedCell>,
    /// Set by the filter engine. `false` marks the row as hidden by search or filter.
    pub passes_filter: bool,
    /// Set by the page window.
    pub on_current_page: bool,
    pub stripe: Option<Stripe>,
}

impl RowHandle {
    fn render(record: &Record, index: usize, columns: &[Column]) -> Self {
        let cells = columns
            .iter()
            .map(|column| RenderedCell {
                text: column.render(record, index),
                class_names: column.class_names.clone(),
            })
            .collect();
        Self {
            record_index: index,
            cells,
            passes_filter: true,
            on_current_page: true,
            stripe: None,
        }
    }

    pub fn is_displayed(&self) -> bool {
        self.passes_filter && self.on_current_page
    }

    pub fn hidden_by_filter(&self) -> bool {
        !self.passes_filter
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub record: Record,
    pub row: RowHandle,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    entries: Vec<Entry>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all records and rebuild their rows. Every row starts out passing the filter
    /// and on the current page.
    pub fn load(&mut self, records: Vec<Record>, columns: &[Column]) {
        let entries: Vec<Entry> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let row = RowHandle::render(&record, index, columns);
                Entry { record, row }
            })
            .collect();
        trace!("Loaded {} records into store", entries.len());
        self.entries = entries;
    }

    /// Apply `permutation`, where `permutation[new] = old`, to records and rows together.
    ///
    /// The permutation is validated before anything moves; an invalid one leaves the store
    /// untouched.
    pub fn reorder(&mut self, permutation: &[usize]) -> Result<(), VTError> {
        let n = self.entries.len();
        if permutation.len() != n {
            return Err(VTError::InvalidPermutation);
        }
        let mut seen = vec![false; n];
        for &old in permutation {
            if old >= n || seen[old] {
                return Err(VTError::InvalidPermutation);
            }
            seen[old] = true;
        }

        let mut slots: Vec<Option<Entry>> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(Some)
            .collect();
        let mut reordered = Vec::with_capacity(n);
        for (new, &old) in permutation.iter().enumerate() {
            if let Some(mut entry) = slots[old].take() {
                entry.row.record_index = new;
                reordered.push(entry);
            }
        }
        self.entries = reordered;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn rows(&self) -> impl Iterator<Item = &RowHandle> {
        self.entries.iter().map(|e| &e.row)
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut RowHandle> {
        self.entries.iter_mut().map(|e| &mut e.row)
    }

    /// Records whose rows pass the current filter, in current order.
    pub fn visible_records(&self) -> impl Iterator<Item = &Record> {
        self.entries
            .iter()
            .filter(|e| e.row.passes_filter)
            .map(|e| &e.record)
    }

    pub fn displayed(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.row.is_displayed())
    }
}
