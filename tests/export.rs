use serde_json::{Value, json};
use vt::{Column, Document, ExportScope, Model, TableElement, TableOptions, Target};

fn model() -> Model {
    let records = vec![
        json!({"id": 1, "name": "Ada, Countess", "quote": "say \"hi\"", "tags": ["x", "y"]}),
        json!({"id": 2, "name": "Grace", "quote": null, "tags": []}),
        json!({"id": 3, "name": "Linus", "quote": "two\nlines"}),
        json!({"id": 4, "name": "Ken", "quote": "plain", "nested": {"deep": 1.5}}),
    ];
    let columns = vec![
        Column::new("id", "ID"),
        Column::new("name", "Name"),
        Column::new("quote", "Quote"),
        Column::new("tags", "Tags"),
        Column::new("nested.deep", "Deep"),
    ];
    let options = TableOptions::default().data(records).columns(columns).per_page(2usize).pagination(true);
    Model::new(Document::new(), Target::from(TableElement::default()), options).unwrap()
}

fn expected_rows(model: &Model) -> Vec<Vec<String>> {
    model
        .visible_data()
        .into_iter()
        .map(|record| model.columns().iter().map(|c| c.value(record).display()).collect())
        .collect()
}

#[test]
fn csv_round_trips_through_a_standard_reader() {
    let mut model = model();
    model.search("a");
    let csv_text = model.to_csv(ExportScope::Visible);

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(csv_text.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["ID", "Name", "Quote", "Tags", "Deep"]);

    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(rows, expected_rows(&model));
    assert_eq!(rows[0], vec!["1", "Ada, Countess", "say \"hi\"", "x,y", ""]);
}

#[test]
fn csv_covers_every_page_and_optionally_filtered_rows() {
    let mut model = model();
    model.search("in");
    assert_eq!(model.current_page(), 1);

    let visible = model.to_csv(ExportScope::Visible);
    assert_eq!(visible.lines().filter(|l| l.starts_with(char::is_numeric)).count(), 2);

    let all = model.to_csv(ExportScope::All);
    let mut reader = csv::Reader::from_reader(all.as_bytes());
    assert_eq!(reader.records().count(), 4);
}

#[test]
fn json_export_keeps_raw_records() {
    let mut model = model();
    model.search("ken");
    let parsed: Value = serde_json::from_str(&model.to_json(ExportScope::Visible).unwrap()).unwrap();
    assert_eq!(parsed, json!([{"id": 4, "name": "Ken", "quote": "plain", "nested": {"deep": 1.5}}]));

    let parsed: Value = serde_json::from_str(&model.to_json(ExportScope::All).unwrap()).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(4));
}

#[test]
fn export_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let model = model();

    let csv_path = dir.path().join(vt::domain::DEFAULT_CSV_FILENAME);
    model.export_csv(&csv_path, ExportScope::Visible).unwrap();
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), model.to_csv(ExportScope::Visible));

    let json_path = dir.path().join(vt::domain::DEFAULT_JSON_FILENAME);
    model.export_json(&json_path, ExportScope::All).unwrap();
    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed[0]["id"], 1);
}

#[test]
fn export_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = model().export_csv(dir.path().join("missing").join("t.csv"), ExportScope::Visible);
    assert!(matches!(result, Err(vt::VTError::IoError(_))));
}
