//! Reads tabular files into records.
//!
//! CSV, Parquet and Arrow IPC files go through polars, one column per rayon task. JSON files
//! must hold an array of objects.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::domain::VTError;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    CSV,
    PARQUET,
    ARROW,
    JSON,
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

/// Records read from a file, with the column names in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_file(path: PathBuf) -> Result<Dataset, VTError> {
    let file_info = get_file_info(path)?;
    let start_time = Instant::now();

    let (columns, records) = match file_info.file_type {
        FileType::CSV => records_from_frame(&load_csv(&file_info.path)?.collect()?)?,
        FileType::PARQUET => records_from_frame(&load_parquet(&file_info.path)?.collect()?)?,
        FileType::ARROW => records_from_frame(&load_arrow(&file_info.path)?.collect()?)?,
        FileType::JSON => records_from_json(&fs::read_to_string(&file_info.path)?)?,
    };

    info!(
        "Loaded {} records with {} columns ({} bytes) in {}ms",
        records.len(),
        columns.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    Ok(Dataset { name, columns, records })
}

pub fn get_file_info(path: PathBuf) -> Result<FileInfo, VTError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => VTError::FileNotFound,
        ErrorKind::PermissionDenied => VTError::PermissionDenied,
        _ => VTError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(VTError::invalid_data("Not a file!"));
    }

    let file_type = detect_file_type(&path)?;
    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}

pub fn detect_file_type(path: &Path) -> Result<FileType, VTError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        Some("JSON") => Ok(FileType::JSON),
        _ => Err(VTError::UnknownFileType),
    }
}

/// Turn a frame into one JSON object per row. Numeric columns become numbers, booleans stay
/// booleans, everything else is read as text. Nulls become `null`.
pub fn records_from_frame(df: &DataFrame) -> Result<(Vec<String>, Vec<Record>), VTError> {
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    let data: Vec<Vec<Value>> = names
        .par_iter()
        .map(|name| load_column(df, name))
        .collect::<Result<Vec<_>, PolarsError>>()?;

    let records = (0..df.height())
        .map(|row| {
            let fields: Map<String, Value> = names
                .iter()
                .zip(&data)
                .map(|(name, column)| (name.clone(), column[row].clone()))
                .collect();
            Value::Object(fields)
        })
        .collect();
    Ok((names, records))
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Value>, PolarsError> {
    let col = df.column(col_name)?;
    let dtype = col.dtype().clone();
    debug!("Column {col_name}: {dtype}");

    let values = if dtype.is_integer() {
        col.cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or(Value::Null))
            .collect()
    } else if dtype.is_float() {
        col.cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| {
                v.and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            })
            .collect()
    } else if dtype == DataType::Boolean {
        col.bool()?
            .into_iter()
            .map(|v| v.map(Value::Bool).unwrap_or(Value::Null))
            .collect()
    } else {
        col.cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null))
            .collect()
    };
    Ok(values)
}

/// Parse a JSON array of objects. Column names are the keys in order of first appearance.
pub fn records_from_json(text: &str) -> Result<(Vec<String>, Vec<Record>), VTError> {
    let Value::Array(records) = serde_json::from_str::<Value>(text)? else {
        return Err(VTError::invalid_data("Expected a JSON array of records"));
    };

    let mut columns: Vec<String> = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(VTError::invalid_data(format!("Record {idx} is not an object")));
        };
        for key in fields.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    Ok((columns, records))
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}
