//! Sortable, filterable, paginated presentation of in-memory records.
//!
//! A [`Model`] attaches to a table in a host [`Document`], owns the records and their display
//! rows, and keeps filter, sort and page consistent after every operation.

pub mod cli;
pub mod controller;
pub mod domain;
pub mod export;
pub mod filter;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod page;
pub mod record;
pub mod schema;
pub mod sort;
pub mod store;
pub mod table;
pub mod ui;
pub mod view;

pub use domain::{Message, TableConfig, VTError};
pub use export::ExportScope;
pub use filter::{ColumnFilters, FilterSpec};
pub use model::{Model, Status, TableOptions};
pub use record::{CellValue, Record};
pub use schema::{Column, ColumnKey, HeaderCell};
pub use sort::{SortDirection, SortKey};
pub use table::{Document, Element, TableElement, Target};
pub use view::Action;
