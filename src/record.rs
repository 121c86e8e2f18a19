//! Records and the values read out of them.

use serde_json::Value;

/// One logical row of data. Usually a JSON object, but any value is accepted.
pub type Record = Value;

/// A value extracted from a record for one column.
///
/// `Missing` means the field (or a segment of its dotted path) does not exist, which is
/// different from a field that exists and holds `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Present(Value),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Missing or `null`. These sort last in every direction.
    pub fn is_null_like(&self) -> bool {
        matches!(self, CellValue::Missing | CellValue::Present(Value::Null))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            CellValue::Missing => None,
            CellValue::Present(v) => Some(v),
        }
    }

    /// Text shown in a cell and written to CSV. Missing and null are empty.
    pub fn display(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            CellValue::Present(v) => value_to_string(v),
        }
    }

    /// Numeric reading of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Missing => None,
            CellValue::Present(v) => value_as_number(v),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        CellValue::Present(value)
    }
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_float(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<String>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

// Integral floats print without a fraction, so 3.0 shows as "3".
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

pub fn value_as_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| !f.is_nan())
}
