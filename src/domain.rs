use std::fmt;
use std::io::Error;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use tracing_error::SpanTrace;

use crate::view::Action;

pub const DEFAULT_PER_PAGE: usize = 25;
pub const DEFAULT_NO_RESULTS_TEXT: &str = "No results found.";
pub const DEFAULT_CSV_FILENAME: &str = "table.csv";
pub const DEFAULT_JSON_FILENAME: &str = "table.json";

pub const HELP_TEXT: &str = "
 q        quit
 ← / →    previous / next page
 Home/End first / last page
 1 - 9    sort by column (again to flip direction)
 /        search
 c        clear search and filters
 + / -    grow / shrink page size
 ?        this help (Esc closes)
";

#[derive(Debug)]
pub enum VTError {
    TargetNotFound(String),
    InvalidPermutation,
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    InvalidData { message: String, context: SpanTrace },
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl VTError {
    /// Data that could be read but not turned into records. Captures the current span trace.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        VTError::InvalidData {
            message: message.into(),
            context: SpanTrace::capture(),
        }
    }
}

impl fmt::Display for VTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VTError::TargetNotFound(target) => write!(f, "Table element not found: {target}"),
            VTError::InvalidPermutation => write!(f, "Row permutation does not match the record store"),
            VTError::IoError(e) => write!(f, "I/O error: {e}"),
            VTError::PolarsError(e) => write!(f, "Failed to read data: {e}"),
            VTError::JsonError(e) => write!(f, "Invalid JSON: {e}"),
            VTError::InvalidData { message, context } => write!(f, "{message}\n{context}"),
            VTError::FileNotFound => write!(f, "File not found"),
            VTError::PermissionDenied => write!(f, "Permission denied"),
            VTError::UnknownFileType => write!(f, "Unknown file type"),
        }
    }
}

impl std::error::Error for VTError {}

impl From<Error> for VTError {
    fn from(err: Error) -> Self {
        VTError::IoError(err)
    }
}

impl From<PolarsError> for VTError {
    fn from(err: PolarsError) -> Self {
        VTError::PolarsError(err)
    }
}

impl From<serde_json::Error> for VTError {
    fn from(err: serde_json::Error) -> Self {
        VTError::JsonError(err)
    }
}

/// Settings of the interactive viewer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Quit,
    Help,
    Exit,
    EnterSearch,
    RawKey(KeyEvent),
    Table(Action),
}
