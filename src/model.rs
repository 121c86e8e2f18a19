use std::path::Path;

use derive_setters::Setters;
use tracing::{debug, error, info, trace, warn};

use crate::domain::{
    DEFAULT_NO_RESULTS_TEXT, DEFAULT_PER_PAGE, HELP_TEXT, Message, VTError,
};
use crate::export::{self, ExportScope};
use crate::filter::{self, ColumnFilters};
use crate::inputter::{InputResult, Inputter};
use crate::page::{self, Control};
use crate::record::Record;
use crate::schema::{Column, resolve_columns};
use crate::sort::{self, SortDirection, SortKey};
use crate::store::{Entry, RecordStore};
use crate::table::{Document, TableElement, Target};
use crate::view::{Action, Changes, ViewSnapshot, ViewState, compute_view};

const CLASS_TABLE: &str = "vanilla-table";
const CLASS_ZEBRA: &str = "vanilla-table-zebra";
const CLASS_SORTING: &str = "sorting-enabled";
const CLASS_SUSPEND: &str = "suspend-transitions";

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct TableOptions {
    /// Records loaded at construction.
    pub data: Vec<Record>,
    /// Explicit columns. Empty means infer them from the table headers.
    pub columns: Vec<Column>,
    pub pagination: bool,
    pub per_page: usize,
    #[setters(strip_option)]
    pub pagination_info: Option<String>,
    #[setters(strip_option)]
    pub pagination_controls: Option<String>,
    pub sorting: bool,
    pub search: bool,
    #[setters(strip_option)]
    pub search_input: Option<String>,
    pub filters: ColumnFilters,
    pub zebra: bool,
    pub no_results_text: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            columns: Vec::new(),
            pagination: false,
            per_page: DEFAULT_PER_PAGE,
            pagination_info: None,
            pagination_controls: None,
            sorting: true,
            search: false,
            search_input: None,
            filters: ColumnFilters::new(),
            zebra: true,
            no_results_text: DEFAULT_NO_RESULTS_TEXT.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    SEARCH,
}

/// Keeps records, rows, filter, sort and page consistent after every change.
///
/// Every mutation goes through [`Model::dispatch`], which reduces the view state and then
/// runs the pipeline: filter (if changed), sort (if changed), page, then zebra stripes,
/// the no-results placeholder and the pagination info and controls.
pub struct Model {
    options: TableOptions,
    document: Document,
    table: String,
    columns: Vec<Column>,
    store: RecordStore,
    view: ViewState,
    snapshot: ViewSnapshot,
    sort_initialized: bool,
    search_binding: Option<String>,
    destroyed: bool,
    pub status: Status,
    modus: Modus,
    input: Inputter,
    last_input: InputResult,
}

impl Model {
    /// Attach to `target` in `document`. Fails if the target table does not exist.
    pub fn new(
        mut document: Document,
        target: impl Into<Target>,
        mut options: TableOptions,
    ) -> Result<Self, VTError> {
        let target = target.into();
        let label = match &target {
            Target::Selector(selector) => selector.clone(),
            Target::Element(_) => "<element>".to_string(),
        };
        let table = target
            .attach(&mut document)
            .ok_or(VTError::TargetNotFound(label))?;

        let headers = document
            .table(&table)
            .map(|t| t.headers.clone())
            .unwrap_or_default();
        let columns = resolve_columns(&options.columns, &headers);

        if let Some(element) = document.table_mut(&table) {
            element.set_class(CLASS_TABLE, true);
            element.set_class(CLASS_ZEBRA, options.zebra);
        }

        let search_binding = if options.search {
            options
                .search_input
                .clone()
                .filter(|selector| document.is_input(selector))
        } else {
            None
        };

        let data = std::mem::take(&mut options.data);
        let view = ViewState::new(options.filters.clone(), options.per_page);
        let store = RecordStore::new();
        let window = page::PageState::new(options.per_page).window(0);
        let snapshot = compute_view(store.rows(), window, &view.sort, 0, options.zebra);

        info!(
            "Attached to {} with {} columns (pagination: {}, sorting: {}, search: {})",
            table,
            columns.len(),
            options.pagination,
            options.sorting,
            search_binding.is_some()
        );

        let mut model = Self {
            options,
            document,
            table,
            columns,
            store,
            view,
            snapshot,
            sort_initialized: false,
            search_binding,
            destroyed: false,
            status: Status::READY,
            modus: Modus::TABLE,
            input: Inputter::default(),
            last_input: InputResult::default(),
        };
        if !data.is_empty() {
            model.load_data(data);
        }
        Ok(model)
    }

    // -------------------- Public table operations ---------------------- //

    /// Replace all records. Sort, filter and page state carry over.
    pub fn load_data(&mut self, records: Vec<Record>) -> &mut Self {
        if self.is_destroyed("load_data") {
            return self;
        }
        self.store.load(records, &self.columns);

        if self.options.sorting && !self.sort_initialized {
            if self.view.sort.is_empty()
                && let Some(column) = sort::default_sort_column(&self.columns)
            {
                debug!("Default sort on column {column}");
                self.view.sort.set_keys(vec![SortKey::asc(column)]);
            }
            if let Some(element) = self.document.table_mut(&self.table) {
                element.set_class(CLASS_SORTING, true);
            }
            self.sort_initialized = true;
        }

        self.reconcile(Changes::ALL);
        self
    }

    pub fn search(&mut self, query: &str) -> &mut Self {
        self.dispatch(Action::Search(query.to_string()))
    }

    pub fn apply_filters(&mut self, filters: ColumnFilters) -> &mut Self {
        self.dispatch(Action::ApplyFilters(filters))
    }

    /// Drop search and filters. The current page is kept, clamped to the new page count.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.dispatch(Action::ClearFilters)
    }

    pub fn go_to_page(&mut self, page: usize) -> &mut Self {
        self.dispatch(Action::GoToPage(page))
    }

    pub fn set_page_size(&mut self, per_page: usize) -> &mut Self {
        if per_page == 0 {
            warn!("Ignoring page size 0, using 1");
        }
        self.dispatch(Action::SetPageSize(per_page))
    }

    /// Header click on `column`.
    pub fn toggle_sort(&mut self, column: usize) -> &mut Self {
        self.dispatch(Action::ToggleSort(column))
    }

    /// Sort by a chain of keys, primary first.
    pub fn set_sort(&mut self, keys: Vec<SortKey>) -> &mut Self {
        self.dispatch(Action::SetSort(keys))
    }

    /// Click on a pagination control.
    pub fn click_control(&mut self, control: &Control) -> &mut Self {
        match control.target() {
            Some(page) => self.go_to_page(page),
            None => self,
        }
    }

    /// Value of an input element changed. Searches if it is the bound search input.
    pub fn input(&mut self, selector: &str, value: &str) -> &mut Self {
        self.document.set_input_value(selector, value);
        if self.search_binding.as_deref() == Some(selector) {
            self.search(value);
        }
        self
    }

    pub fn dispatch(&mut self, action: Action) -> &mut Self {
        if self.is_destroyed("dispatch") {
            return self;
        }
        if !self.options.sorting && matches!(action, Action::ToggleSort(_) | Action::SetSort(_)) {
            trace!("Sorting disabled, ignoring {:?}", action);
            return self;
        }
        let (next, changes) = self.view.reduce(&action, &self.columns);
        trace!("{:?} => {:?}", action, changes);
        self.view = next;
        self.reconcile(changes);
        self
    }

    pub fn to_csv(&self, scope: ExportScope) -> String {
        export::to_csv(&self.columns, self.scoped(scope))
    }

    pub fn to_json(&self, scope: ExportScope) -> Result<String, VTError> {
        export::to_json(self.scoped(scope))
    }

    pub fn export_csv(&self, filename: impl AsRef<Path>, scope: ExportScope) -> Result<(), VTError> {
        export::write_file(filename.as_ref(), &self.to_csv(scope))
    }

    pub fn export_json(&self, filename: impl AsRef<Path>, scope: ExportScope) -> Result<(), VTError> {
        export::write_file(filename.as_ref(), &self.to_json(scope)?)
    }

    /// Records passing search and filters, in current order, regardless of page.
    pub fn visible_data(&self) -> Vec<&Record> {
        self.store.visible_records().collect()
    }

    pub fn all_data(&self) -> Vec<&Record> {
        self.store.records().collect()
    }

    /// Detach from the table. Later mutations are ignored.
    pub fn destroy(&mut self) {
        if let Some(element) = self.document.table_mut(&self.table) {
            for class in [CLASS_TABLE, CLASS_ZEBRA, CLASS_SORTING, CLASS_SUSPEND] {
                element.set_class(class, false);
            }
        }
        self.search_binding = None;
        self.destroyed = true;
        info!("Destroyed table {}", self.table);
    }

    /// Called by the host after a frame was drawn. Re-enables transitions.
    pub fn after_paint(&mut self) {
        if let Some(element) = self.document.table_mut(&self.table)
            && element.has_class(CLASS_SUSPEND)
        {
            element.set_class(CLASS_SUSPEND, false);
        }
    }

    // -------------------- Accessors ---------------------- //

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn table_element(&self) -> Option<&TableElement> {
        self.document.table(&self.table)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    /// Entries currently shown: passing the filter and on the current page.
    pub fn displayed(&self) -> impl Iterator<Item = &Entry> {
        self.store.displayed()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn snapshot(&self) -> &ViewSnapshot {
        &self.snapshot
    }

    pub fn current_page(&self) -> usize {
        self.snapshot.window.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.snapshot.window.total_pages
    }

    pub fn no_results_visible(&self) -> bool {
        self.snapshot.no_results
    }

    pub fn no_results_text(&self) -> &str {
        &self.options.no_results_text
    }

    pub fn search_query(&self) -> &str {
        self.view.filter.search_query()
    }

    // -------------------- Pipeline ---------------------- //

    fn reconcile(&mut self, changes: Changes) {
        if changes.filter {
            self.with_transitions_suspended(|model| {
                if model.view.filter.is_active() {
                    filter::recompute_visibility(&mut model.store, &model.columns, &model.view.filter)
                } else {
                    filter::clear(&mut model.store, &mut model.view.filter)
                }
            });
        }
        if changes.sort
            && self.options.sorting
            && let Err(e) = sort::apply_sort(&mut self.store, &self.columns, &self.view.sort)
        {
            error!("Sorting failed: {e}");
        }

        let window = page::recompute_page(&mut self.store, &mut self.view.page, self.options.pagination);
        let header_count = self.table_element().map(|t| t.headers.len()).unwrap_or(0);
        let snapshot = compute_view(
            self.store.rows(),
            window,
            &self.view.sort,
            header_count,
            self.options.zebra,
        );
        self.present(&snapshot);
        self.snapshot = snapshot;
    }

    /// Write a computed view to rows and document.
    fn present(&mut self, snapshot: &ViewSnapshot) {
        for (row, stripe) in self.store.rows_mut().zip(&snapshot.stripes) {
            row.stripe = *stripe;
        }

        if let Some(element) = self.document.table_mut(&self.table) {
            for (header, direction) in element.headers.iter_mut().zip(&snapshot.header_sort) {
                header.set_class(SortDirection::Asc.class(), *direction == Some(SortDirection::Asc));
                header.set_class(SortDirection::Desc.class(), *direction == Some(SortDirection::Desc));
            }
        }

        if !self.options.pagination {
            return;
        }
        if let Some(selector) = &self.options.pagination_info
            && !self.document.set_text(selector, snapshot.info.clone())
        {
            trace!("No pagination info element at {selector}");
        }
        if let Some(selector) = &self.options.pagination_controls
            && !self.document.set_controls(selector, snapshot.controls.clone())
        {
            trace!("No pagination controls element at {selector}");
        }
    }

    fn with_transitions_suspended(&mut self, f: impl FnOnce(&mut Self)) {
        if let Some(element) = self.document.table_mut(&self.table) {
            element.set_class(CLASS_SUSPEND, true);
        }
        f(self);
    }

    fn scoped(&self, scope: ExportScope) -> Vec<&Record> {
        match scope {
            ExportScope::Visible => self.visible_data(),
            ExportScope::All => self.all_data(),
        }
    }

    fn is_destroyed(&self, operation: &str) -> bool {
        if self.destroyed {
            warn!("{operation} called on a destroyed table");
        }
        self.destroyed
    }

    // -------------------- Interactive viewer ---------------------- //

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn popup(&self) -> Option<&str> {
        (self.modus == Modus::POPUP).then_some(HELP_TEXT)
    }

    /// The search line while it is being edited.
    pub fn search_line(&self) -> Option<&InputResult> {
        (self.modus == Modus::SEARCH).then_some(&self.last_input)
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::SEARCH
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), VTError> {
        let Some(msg) = message else {
            return Ok(());
        };
        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.modus = Modus::POPUP,
                Message::EnterSearch => self.enter_search(),
                Message::Table(action) => {
                    self.dispatch(action);
                }
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.modus = Modus::TABLE,
                _ => (),
            },
            Modus::SEARCH => {
                if let Message::RawKey(key) = msg {
                    self.last_input = self.input.read(key);
                    self.handle_search_input();
                }
            }
        }
        Ok(())
    }

    fn enter_search(&mut self) {
        let Some(selector) = self.search_binding.clone() else {
            trace!("No search input bound");
            return;
        };
        let current = self.document.input_value(&selector).unwrap_or_default().to_string();
        self.input.clear();
        self.input.set(&current);
        self.last_input = self.input.get();
        self.modus = Modus::SEARCH;
    }

    fn handle_search_input(&mut self) {
        let Some(selector) = self.search_binding.clone() else {
            self.modus = Modus::TABLE;
            return;
        };
        let value = self.last_input.input.clone();
        if self.document.input_value(&selector) != Some(value.as_str()) {
            self.input(&selector, &value);
        }
        if self.last_input.finished {
            self.modus = Modus::TABLE;
        }
    }
}
