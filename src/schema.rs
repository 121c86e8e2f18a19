//! Column definitions and cell value extraction.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use derive_setters::Setters;
use serde_json::Value;
use tracing::debug;

use crate::record::{CellValue, Record};

pub type Accessor = Arc<dyn Fn(&Record) -> CellValue + Send + Sync>;
pub type Comparator = Arc<dyn Fn(&Value, &Value, &Record, &Record) -> Ordering + Send + Sync>;
pub type Renderer = Arc<dyn Fn(&CellValue, &Record, usize) -> String + Send + Sync>;

/// Where a column reads its value from.
#[derive(Clone)]
pub enum ColumnKey {
    /// Field name, or a dotted path such as `user.address.city`.
    Field(String),
    Accessor(Accessor),
}

impl ColumnKey {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ColumnKey::Field(name) => Some(name),
            ColumnKey::Accessor(_) => None,
        }
    }
}

impl fmt::Debug for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Field(name) => f.debug_tuple("Field").field(name).finish(),
            ColumnKey::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

impl From<&str> for ColumnKey {
    fn from(name: &str) -> Self {
        ColumnKey::Field(name.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(name: String) -> Self {
        ColumnKey::Field(name)
    }
}

#[derive(Clone, Setters)]
#[setters(into)]
pub struct Column {
    #[setters(skip)]
    pub key: ColumnKey,
    pub title: String,
    pub sortable: bool,
    #[setters(skip)]
    pub comparator: Option<Comparator>,
    #[setters(skip)]
    pub renderer: Option<Renderer>,
    #[setters(strip_option)]
    pub class_names: Option<String>,
}

impl Column {
    pub fn new(key: impl Into<ColumnKey>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            sortable: true,
            comparator: None,
            renderer: None,
            class_names: None,
        }
    }

    pub fn accessor(
        title: impl Into<String>,
        f: impl Fn(&Record) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self::new(ColumnKey::Accessor(Arc::new(f)), title)
    }

    pub fn comparator(
        mut self,
        f: impl Fn(&Value, &Value, &Record, &Record) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(Arc::new(f));
        self
    }

    pub fn renderer(
        mut self,
        f: impl Fn(&CellValue, &Record, usize) -> String + Send + Sync + 'static,
    ) -> Self {
        self.renderer = Some(Arc::new(f));
        self
    }

    pub fn value(&self, record: &Record) -> CellValue {
        get_cell_value(record, &self.key)
    }

    /// Cell text for a record at `index`: the renderer output, or the stringified value.
    pub fn render(&self, record: &Record, index: usize) -> String {
        let value = self.value(record);
        match &self.renderer {
            Some(render) => render(&value, record, index),
            None => value.display(),
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("sortable", &self.sortable)
            .field("comparator", &self.comparator.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("class_names", &self.class_names)
            .finish()
    }
}

/// A header cell of the host table, with its `data-field` and `data-sortable` attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderCell {
    pub text: String,
    pub field: Option<String>,
    pub sortable: Option<String>,
    pub classes: Vec<String>,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_sortable(mut self, sortable: impl Into<String>) -> Self {
        self.sortable = Some(sortable.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn set_class(&mut self, class: &str, enabled: bool) {
        let present = self.has_class(class);
        if enabled && !present {
            self.classes.push(class.to_string());
        } else if !enabled && present {
            self.classes.retain(|c| c != class);
        }
    }
}

/// The explicit column configuration if there is one, otherwise one column per header cell.
pub fn resolve_columns(explicit: &[Column], headers: &[HeaderCell]) -> Vec<Column> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(index, th)| {
            let key = th
                .field
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| index.to_string());
            Column::new(key, th.text.trim()).sortable(th.sortable.as_deref() != Some("false"))
        })
        .collect();
    debug!("Inferred {} columns from table headers", columns.len());
    columns
}

pub fn get_cell_value(record: &Record, key: &ColumnKey) -> CellValue {
    match key {
        ColumnKey::Accessor(f) => f(record),
        ColumnKey::Field(path) if path.contains('.') => {
            let mut current = record;
            for segment in path.split('.') {
                match lookup(current, segment) {
                    Some(next) => current = next,
                    None => return CellValue::Missing,
                }
            }
            CellValue::Present(current.clone())
        }
        ColumnKey::Field(name) => match lookup(record, name) {
            Some(v) => CellValue::Present(v.clone()),
            None => CellValue::Missing,
        },
    }
}

fn lookup<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_path_walks_nested_objects() {
        let record = json!({"user": {"name": "Ada", "tags": ["x", "y"], "nick": null}});
        assert_eq!(
            get_cell_value(&record, &"user.name".into()),
            CellValue::Present(json!("Ada"))
        );
        assert_eq!(
            get_cell_value(&record, &"user.tags.1".into()),
            CellValue::Present(json!("y"))
        );
        assert_eq!(get_cell_value(&record, &"user.email".into()), CellValue::Missing);
        assert_eq!(get_cell_value(&record, &"user.nick.first".into()), CellValue::Missing);
        assert_eq!(
            get_cell_value(&record, &"user.nick".into()),
            CellValue::Present(Value::Null)
        );
    }

    #[test]
    fn direct_and_accessor_lookup() {
        let record = json!({"id": 3, "first": "Ada", "last": "Lovelace"});
        assert_eq!(get_cell_value(&record, &"id".into()), CellValue::Present(json!(3)));
        assert_eq!(get_cell_value(&record, &"age".into()), CellValue::Missing);

        let full = Column::accessor("Name", |r| {
            CellValue::Present(json!(format!("{} {}", r["first"].as_str().unwrap_or(""), r["last"].as_str().unwrap_or(""))))
        });
        assert_eq!(full.value(&record).display(), "Ada Lovelace");
    }

    #[test]
    fn explicit_columns_win_over_headers() {
        let explicit = vec![Column::new("id", "ID")];
        let headers = vec![HeaderCell::new("Name").with_field("name")];
        let columns = resolve_columns(&explicit, &headers);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].title, "ID");
    }

    #[test]
    fn columns_inferred_from_headers() {
        let headers = vec![
            HeaderCell::new(" Name ").with_field("name"),
            HeaderCell::new("Notes").with_sortable("false"),
        ];
        let columns = resolve_columns(&[], &headers);
        assert_eq!(columns[0].key.field_name(), Some("name"));
        assert_eq!(columns[0].title, "Name");
        assert!(columns[0].sortable);
        assert_eq!(columns[1].key.field_name(), Some("1"));
        assert!(!columns[1].sortable);
    }

    #[test]
    fn empty_field_falls_back_to_position() {
        let headers = vec![HeaderCell::new("ID").with_field("id"), HeaderCell::new("X").with_field("")];
        let columns = resolve_columns(&[], &headers);
        assert_eq!(columns[1].key.field_name(), Some("1"));
    }

    #[test]
    fn render_uses_renderer_or_text() {
        let record = json!({"price": 4, "missing": null});
        let plain = Column::new("missing", "Missing");
        assert_eq!(plain.render(&record, 0), "");

        let price = Column::new("price", "Price").renderer(|v, _, i| format!("#{i}: ${}", v.display()));
        assert_eq!(price.render(&record, 2), "#2: $4");
    }
}
