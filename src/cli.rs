//! Command line arguments of the `vt` binary.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use crate::domain::{DEFAULT_CSV_FILENAME, DEFAULT_JSON_FILENAME, DEFAULT_PER_PAGE, VTError};
use crate::export::ExportScope;
use crate::filter::{ColumnFilters, FilterSpec};
use crate::model::TableOptions;
use crate::page::Control;
use crate::schema::{Column, HeaderCell};
use crate::sort::{SortDirection, SortKey};
use crate::table::{Document, Element, TableElement};

pub const TABLE_SELECTOR: &str = "#table";
pub const INFO_SELECTOR: &str = "#info";
pub const CONTROLS_SELECTOR: &str = "#pages";
pub const SEARCH_SELECTOR: &str = "#search";

/// View, search, sort and page through tabular data files
#[derive(Parser, Debug)]
#[command(name = "vt", version, about)]
pub struct CliArgs {
    /// CSV, Parquet, Arrow IPC or JSON file
    #[arg(value_name = "FILE")]
    pub path: String,

    /// Rows per page
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PER_PAGE)]
    pub per_page: usize,

    /// Show all rows on one page
    #[arg(long)]
    pub no_pagination: bool,

    /// Initial search query
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,

    /// Column filter, `key=value` or `key=a|b`. Repeatable.
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filter: Vec<(String, FilterSpec)>,

    /// Sort key, `COLUMN` or `COLUMN:desc`. Repeatable, primary first.
    #[arg(long, value_name = "COLUMN[:desc]")]
    pub sort: Vec<String>,

    /// Write the rows as CSV to PATH
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_CSV_FILENAME)]
    pub export_csv: Option<String>,

    /// Write the records as JSON to PATH
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_JSON_FILENAME)]
    pub export_json: Option<String>,

    /// Export every record, not only those passing search and filters
    #[arg(long)]
    pub all: bool,

    /// Copy the CSV to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Print the CSV to stdout
    #[arg(long)]
    pub print: bool,

    /// Write logs to PATH
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    pub fn is_interactive(&self) -> bool {
        self.export_csv.is_none() && self.export_json.is_none() && !self.copy && !self.print
    }

    pub fn scope(&self) -> ExportScope {
        ExportScope::from_include_filtered(self.all)
    }

    pub fn table_options(&self) -> TableOptions {
        TableOptions::default()
            .pagination(!self.no_pagination)
            .per_page(self.per_page)
            .pagination_info(INFO_SELECTOR)
            .pagination_controls(CONTROLS_SELECTOR)
            .search(true)
            .search_input(SEARCH_SELECTOR)
            .filters(self.filter.iter().cloned().collect::<ColumnFilters>())
    }
}

/// `~` and environment variables expanded.
pub fn expand_path(path: &str) -> Result<PathBuf, VTError> {
    let expanded = shellexpand::full(path).map_err(|e| VTError::invalid_data(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Host document for a table with one header per column name.
pub fn document_for(columns: &[String]) -> Document {
    let headers = columns
        .iter()
        .map(|name| HeaderCell::new(name.as_str()).with_field(name.as_str()))
        .collect();
    Document::new()
        .with(TABLE_SELECTOR, Element::Table(TableElement::new(headers)))
        .with(INFO_SELECTOR, Element::Text(String::new()))
        .with(CONTROLS_SELECTOR, Element::Controls(Vec::<Control>::new()))
        .with(SEARCH_SELECTOR, Element::Input(String::new()))
}

pub fn parse_filter(s: &str) -> Result<(String, FilterSpec), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid filter `{s}`, expected KEY=VALUE"))?;
    if key.is_empty() {
        return Err(format!("invalid filter `{s}`, empty key"));
    }
    let spec = if value.contains('|') {
        FilterSpec::OneOf(value.split('|').map(filter_value).collect())
    } else {
        FilterSpec::Exact(filter_value(value))
    };
    Ok((key.to_string(), spec))
}

// Numbers are matched by value, everything else as text.
fn filter_value(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(s.to_string()))
}

/// Resolve `COLUMN[:desc]` against the columns. COLUMN is a field, a title or a 1-based index.
pub fn parse_sort(spec: &str, columns: &[Column]) -> Option<SortKey> {
    let (name, direction) = match spec.rsplit_once(':') {
        Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, SortDirection::Desc),
        Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, SortDirection::Asc),
        _ => (spec, SortDirection::Asc),
    };
    let column = columns
        .iter()
        .position(|c| c.key.field_name() == Some(name) || c.title == name)
        .or_else(|| {
            name.parse::<usize>()
                .ok()
                .filter(|n| (1..=columns.len()).contains(n))
                .map(|n| n - 1)
        })?;
    Some(SortKey { column, direction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;
    use serde_json::json;

    #[test]
    fn filters() {
        let (key, spec) = parse_filter("status=active").unwrap();
        assert_eq!(key, "status");
        assert!(spec.matches(&CellValue::Present(json!("active")), &json!({})));

        let (_, spec) = parse_filter("age=30|31").unwrap();
        assert!(spec.matches(&CellValue::Present(json!(31)), &json!({})));
        assert!(!spec.matches(&CellValue::Present(json!(32)), &json!({})));

        assert!(parse_filter("novalue").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn sort_keys() {
        let columns = vec![Column::new("id", "ID"), Column::new("name", "Name")];
        assert_eq!(parse_sort("name", &columns), Some(SortKey::asc(1)));
        assert_eq!(parse_sort("Name:desc", &columns), Some(SortKey::desc(1)));
        assert_eq!(parse_sort("1:DESC", &columns), Some(SortKey::desc(0)));
        assert_eq!(parse_sort("city", &columns), None);
        assert_eq!(parse_sort("3", &columns), None);
    }

    #[test]
    fn arguments() {
        let args = CliArgs::try_parse_from([
            "vt", "data.csv", "--filter", "city=Oslo", "--sort", "id:desc", "--print", "--all",
        ])
        .unwrap();
        assert!(!args.is_interactive());
        assert_eq!(args.scope(), ExportScope::All);
        assert_eq!(args.per_page, DEFAULT_PER_PAGE);
        let options = args.table_options();
        assert!(options.pagination);
        assert_eq!(options.filters.len(), 1);

        let args = CliArgs::try_parse_from(["vt", "data.csv", "--export-json"]).unwrap();
        assert_eq!(args.export_json.as_deref(), Some(DEFAULT_JSON_FILENAME));
        assert_eq!(args.export_csv, None);
    }

    #[test]
    fn document_has_every_element() {
        let document = document_for(&["id".to_string(), "name".to_string()]);
        assert_eq!(document.table(TABLE_SELECTOR).unwrap().headers.len(), 2);
        assert!(document.is_input(SEARCH_SELECTOR));
        assert_eq!(document.text(INFO_SELECTOR), Some(""));
    }
}
