//! CSV and JSON serialization of the table data.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::VTError;
use crate::record::Record;
use crate::schema::Column;

/// Which records an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportScope {
    /// Records passing search and filters, on every page.
    #[default]
    Visible,
    /// Every loaded record.
    All,
}

impl ExportScope {
    /// Scope for the `include_filtered` flag: `true` includes the filtered-out records too.
    pub fn from_include_filtered(include_filtered: bool) -> Self {
        if include_filtered { ExportScope::All } else { ExportScope::Visible }
    }
}

/// Quote a field if it contains a comma, quote or newline, doubling inner quotes.
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header of column titles, then one line per record. No trailing newline.
pub fn to_csv<'a>(columns: &[Column], records: impl IntoIterator<Item = &'a Record>) -> String {
    let header = columns
        .iter()
        .map(|c| escape_csv(&c.title))
        .collect::<Vec<String>>()
        .join(",");

    let mut lines = vec![header];
    lines.extend(records.into_iter().map(|record| {
        columns
            .iter()
            .map(|c| escape_csv(&c.value(record).display()))
            .collect::<Vec<String>>()
            .join(",")
    }));
    lines.join("\n")
}

/// The raw records as a pretty printed JSON array.
pub fn to_json<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<String, VTError> {
    let records: Vec<&Record> = records.into_iter().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn write_file(path: &Path, content: &str) -> Result<(), VTError> {
    fs::write(path, content)?;
    info!("Exported {} bytes to {}", content.len(), path.display());
    Ok(())
}
