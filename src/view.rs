//! Explicit view state and its transitions.
//!
//! `ViewState::reduce` is the only place the view state changes. It is pure: it returns the
//! next state and which parts of the pipeline have to run. `compute_view` derives the
//! presentation from the rows after the pipeline ran, again without touching anything.

use crate::filter::{ColumnFilters, FilterState};
use crate::page::{self, Control, PageState, PageWindow};
use crate::schema::Column;
use crate::sort::{SortDirection, SortKey, SortState};
use crate::store::{RowHandle, Stripe};

#[derive(Debug, Clone)]
pub enum Action {
    Search(String),
    ApplyFilters(ColumnFilters),
    ClearFilters,
    /// Header click on a column.
    ToggleSort(usize),
    SetSort(Vec<SortKey>),
    GoToPage(usize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    SetPageSize(usize),
}

/// Pipeline stages an action requires. Paging always runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    pub filter: bool,
    pub sort: bool,
}

impl Changes {
    pub const NONE: Changes = Changes { filter: false, sort: false };
    pub const FILTER: Changes = Changes { filter: true, sort: false };
    pub const SORT: Changes = Changes { filter: false, sort: true };
    pub const ALL: Changes = Changes { filter: true, sort: true };
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub sort: SortState,
    pub filter: FilterState,
    pub page: PageState,
}

impl ViewState {
    pub fn new(filters: ColumnFilters, per_page: usize) -> Self {
        Self {
            sort: SortState::default(),
            filter: FilterState::new(filters),
            page: PageState::new(per_page),
        }
    }

    pub fn reduce(&self, action: &Action, columns: &[Column]) -> (ViewState, Changes) {
        let mut next = self.clone();
        let changes = match action {
            Action::Search(query) => {
                next.filter.set_search_query(query);
                next.page.set_current_page(1);
                Changes::FILTER
            }
            Action::ApplyFilters(filters) => {
                next.filter.set_column_filters(filters.clone());
                next.page.set_current_page(1);
                Changes::FILTER
            }
            Action::ClearFilters => {
                next.filter.reset();
                Changes::FILTER
            }
            Action::ToggleSort(column) => match columns.get(*column) {
                Some(c) if c.sortable => {
                    next.sort.toggle(*column);
                    next.page.set_current_page(1);
                    Changes::SORT
                }
                _ => Changes::NONE,
            },
            Action::SetSort(keys) => {
                next.sort.set_keys(keys.clone());
                next.page.set_current_page(1);
                Changes::SORT
            }
            Action::GoToPage(n) => {
                next.page.set_current_page(*n);
                Changes::NONE
            }
            Action::NextPage => {
                next.page.set_current_page(self.page.current_page().saturating_add(1));
                Changes::NONE
            }
            Action::PrevPage => {
                next.page.set_current_page(self.page.current_page().saturating_sub(1));
                Changes::NONE
            }
            Action::FirstPage => {
                next.page.set_current_page(1);
                Changes::NONE
            }
            Action::LastPage => {
                next.page.set_current_page(usize::MAX);
                Changes::NONE
            }
            Action::SetPageSize(n) => {
                next.page.set_per_page(*n);
                Changes::NONE
            }
        };
        (next, changes)
    }
}

/// Presentation derived from the rows once filter, sort and page are settled.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    /// Zebra parity per row in store order. `None` for rows not displayed.
    pub stripes: Vec<Option<Stripe>>,
    pub displayed: usize,
    pub no_results: bool,
    pub window: PageWindow,
    pub info: String,
    pub controls: Vec<Control>,
    /// Sort marker per header cell.
    pub header_sort: Vec<Option<SortDirection>>,
}

pub fn compute_view<'a>(
    rows: impl IntoIterator<Item = &'a RowHandle>,
    window: PageWindow,
    sort: &SortState,
    header_count: usize,
    zebra: bool,
) -> ViewSnapshot {
    let mut displayed = 0;
    let stripes: Vec<Option<Stripe>> = rows
        .into_iter()
        .map(|row| {
            if !row.is_displayed() {
                return None;
            }
            let stripe = Stripe::for_position(displayed);
            displayed += 1;
            zebra.then_some(stripe)
        })
        .collect();

    ViewSnapshot {
        stripes,
        displayed,
        no_results: displayed == 0,
        window,
        info: page::info_text(&window),
        controls: page::controls(&window),
        header_sort: (0..header_count).map(|i| sort.direction_of(i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![Column::new("id", "ID"), Column::new("notes", "Notes").sortable(false)]
    }

    fn paged(state: &ViewState, page: usize) -> ViewState {
        let mut next = state.clone();
        next.page.set_current_page(page);
        next
    }

    #[test]
    fn search_and_filters_reset_page() {
        let state = paged(&ViewState::default(), 3);
        let (next, changes) = state.reduce(&Action::Search("Ab".into()), &columns());
        assert_eq!(changes, Changes::FILTER);
        assert_eq!(next.page.current_page(), 1);
        assert_eq!(next.filter.search_query(), "ab");

        let filters = ColumnFilters::new().with("id", FilterSpec::Exact(json!(1)));
        let (next, _) = state.reduce(&Action::ApplyFilters(filters), &columns());
        assert_eq!(next.page.current_page(), 1);
        assert_eq!(next.filter.column_filters().len(), 1);
    }

    #[test]
    fn clear_keeps_page() {
        let state = paged(&ViewState::default(), 3);
        let (next, changes) = state.reduce(&Action::ClearFilters, &columns());
        assert_eq!(changes, Changes::FILTER);
        assert_eq!(next.page.current_page(), 3);
    }

    #[test]
    fn sort_on_unsortable_column_is_ignored() {
        let state = paged(&ViewState::default(), 2);
        let (next, changes) = state.reduce(&Action::ToggleSort(1), &columns());
        assert_eq!(changes, Changes::NONE);
        assert!(next.sort.is_empty());
        assert_eq!(next.page.current_page(), 2);

        let (next, changes) = state.reduce(&Action::ToggleSort(0), &columns());
        assert_eq!(changes, Changes::SORT);
        assert_eq!(next.sort.keys(), &[SortKey::asc(0)]);
        assert_eq!(next.page.current_page(), 1);

        let (_, changes) = state.reduce(&Action::ToggleSort(7), &columns());
        assert_eq!(changes, Changes::NONE);
    }

    #[test]
    fn next_page_saturates() {
        let state = paged(&ViewState::default(), usize::MAX);
        let (next, changes) = state.reduce(&Action::NextPage, &columns());
        assert_eq!(changes, Changes::NONE);
        assert_eq!(next.page.current_page(), usize::MAX);
    }

    #[test]
    fn reduce_does_not_mutate_state() {
        let state = ViewState::default();
        let _ = state.reduce(&Action::SetPageSize(5), &columns());
        assert_eq!(state.page.per_page(), 25);
    }

    #[test]
    fn stripes_follow_displayed_rows() {
        let row = |passes, on_page| RowHandle {
            record_index: 0,
            cells: Vec::new(),
            passes_filter: passes,
            on_current_page: on_page,
            stripe: None,
        };
        let rows = vec![row(true, true), row(false, false), row(true, true), row(true, false), row(true, true)];
        let window = PageState::new(3).window(4);
        let snapshot = compute_view(&rows, window, &SortState::new(vec![SortKey::desc(1)]), 2, true);
        assert_eq!(
            snapshot.stripes,
            vec![Some(Stripe::Odd), None, Some(Stripe::Even), None, Some(Stripe::Odd)]
        );
        assert_eq!(snapshot.displayed, 3);
        assert!(!snapshot.no_results);
        assert_eq!(snapshot.header_sort, vec![None, Some(SortDirection::Desc)]);

        let snapshot = compute_view(&rows[1..2], window, &SortState::default(), 0, false);
        assert!(snapshot.no_results);
        assert_eq!(snapshot.stripes, vec![None]);
    }
}
