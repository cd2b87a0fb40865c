//! Integration tests for the command implementations.

use std::fs;
use std::path::PathBuf;

use csvy_cli::commands::{
    ConvertOptions, HeaderFormat, header_text, preview_table, run_convert, run_validate,
};
use tempfile::TempDir;

const PRICES: &str = "\
# ---
# title: Oil prices
# csv_dialect:
#   delimiter: ','
# schema:
#   fields:
#   - name: Date
#     type: date
#   - name: WTI
#     type: number
# ---
Date,WTI
1986-01-02,25.56
1986-01-03,26.00
1986-01-06,26.53
";

fn fixture(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("prices.csvy");
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn header_as_yaml() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, PRICES);
    let text = header_text(&path, "---", HeaderFormat::Yaml).expect("header");

    insta::assert_snapshot!(text, @r#"
    title: Oil prices
    csv_dialect:
      delimiter: ','
      doublequote: true
      escapechar: null
      lineterminator: "\r\n"
      quotechar: '"'
      skipinitialspace: false
    schema:
      fields:
      - name: Date
        type: date
      - name: WTI
        type: number
    "#);
}

#[test]
fn header_as_json() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "---\ntitle: t\ntags: [a, b]\n---\nx\n");
    let text = header_text(&path, "---", HeaderFormat::Json).expect("header");

    insta::assert_snapshot!(text, @r#"
    {
      "title": "t",
      "tags": [
        "a",
        "b"
      ]
    }
    "#);
}

#[test]
fn validate_reports_body_shape() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, PRICES);
    let summary = run_validate(&path, "---").expect("validate");

    assert!(summary.is_clean());
    assert_eq!(summary.header_lines, 11);
    assert_eq!(summary.keys, vec!["title", "csv_dialect", "schema"]);
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.columns, 2);
}

#[test]
fn validate_flags_missing_schema_fields() {
    let dir = TempDir::new().unwrap();
    let contents = PRICES.replace("Date,WTI\n", "Day,WTI\n");
    let path = fixture(&dir, &contents);
    let summary = run_validate(&path, "---").expect("validate");

    assert_eq!(summary.missing_fields, vec!["Date"]);
}

#[test]
fn validate_fails_on_bad_header() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "---\ncsv_dialect:\n  delimiter: ab\n---\nx\n");
    assert!(run_validate(&path, "---").is_err());
}

#[test]
fn preview_limits_rows() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, PRICES);
    let table = preview_table(&path, "---", 2).expect("preview");

    let text = table.to_string();
    assert!(text.contains("WTI"));
    assert!(text.contains("1986-01-03"));
    assert!(!text.contains("1986-01-06"));
}

#[test]
fn convert_changes_prefix_and_delimiter() {
    let dir = TempDir::new().unwrap();
    let input = fixture(&dir, PRICES);
    let output = dir.path().join("converted.csvy");
    let options = ConvertOptions {
        marker: "---".to_string(),
        comment: Some(String::new()),
        delimiter: Some('\t'),
    };

    let rows = run_convert(&input, &output, &options).expect("convert");
    assert_eq!(rows, 4);

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("---\ntitle: Oil prices\n"));
    assert!(text.contains("delimiter: \"\\t\"\n"));
    assert!(text.ends_with("1986-01-06\t26.53\r\n"));

    let summary = run_validate(&output, "---").expect("validate output");
    assert_eq!(summary.delimiter, '\t');
    assert_eq!(summary.rows, 4);
}
