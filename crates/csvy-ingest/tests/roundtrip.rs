use std::fs;

use csvy_core::{CSV_DIALECT, CsvDialect, Header, ReadOptions, SCHEMA, TableSchema, read_metadata};
use csvy_ingest::{
    ArrayReadOptions, Body, ColumnNames, Frame, NumericArray, PolarsReadOptions, RowReadOptions,
    WriteOptions, Writer, read_to_array, read_to_columns, read_to_dataframe, read_to_polars,
    read_to_rows, write,
};
use polars::prelude::*;
use tempfile::TempDir;

const PRICES: &str = "\
# ---
# title: Oil prices
# csv_dialect:
#   delimiter: ';'
#   lineterminator: \"\\n\"
# schema:
#   fields:
#   - name: Date
#     type: date
#   - name: WTI
#     type: number
# ---
Date;WTI
1986-01-02;25.56
1986-01-03;26.00
# a trailing note
1986-01-06;26.53
";

fn fixture(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn polars_reader_uses_header_dialect_and_comment() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "prices.csvy", PRICES);

    let (df, header) = read_to_dataframe(&path, &PolarsReadOptions::default()).expect("read");
    assert_eq!(df.shape(), (3, 2));
    assert_eq!(df.get_column_names_str(), vec!["Date", "WTI"]);
    assert_eq!(df.column("WTI").unwrap().dtype(), &DataType::Float64);

    let schema = header.section::<TableSchema>(SCHEMA).expect("typed schema");
    assert_eq!(schema.field_names(), vec!["Date", "WTI"]);
}

#[test]
fn lazy_frame_can_be_filtered_before_collecting() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "prices.csvy", PRICES);

    let (frame, _) = read_to_polars(&path, &PolarsReadOptions::default(), false).expect("scan");
    let Frame::Lazy(lf) = frame else {
        panic!("expected a lazy frame");
    };
    let df = lf.filter(col("WTI").gt(lit(26.0))).collect().expect("collect");
    assert_eq!(df.height(), 1);
}

#[test]
fn row_reader_sees_comment_lines_as_data() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "prices.csvy", PRICES);

    let (rows, _) = read_to_rows(&path, &RowReadOptions::default()).expect("rows");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], vec!["Date", "WTI"]);
    assert_eq!(rows[3], vec!["# a trailing note"]);
}

#[test]
fn columns_from_first_row() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "prices.csvy", PRICES);

    let (columns, _) =
        read_to_columns(&path, &RowReadOptions::default(), &ColumnNames::Row(0), "").expect("cols");
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].0, "Date");
    assert_eq!(columns[1].1, vec!["25.56", "26.00", "", "26.53"]);
}

#[test]
fn frame_written_then_read_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frame.csvy");
    let df = df! {
        "id" => [1i64, 2, 3],
        "name" => ["a", "b;c", "d"],
    }
    .unwrap();

    let mut header = Header::new();
    header.insert_section(
        CSV_DIALECT,
        CsvDialect {
            delimiter: ';',
            ..CsvDialect::default()
        },
    );
    let options = WriteOptions::default().with_comment("# ");
    write(&path, Body::Frame(Frame::Eager(df.clone())), &header, &options).expect("write");

    let (read, read_header) = read_to_dataframe(&path, &PolarsReadOptions::default()).expect("read");
    assert!(read.equals(&df));
    assert_eq!(read_header, csvy_core::validate_read(&header).unwrap());
}

#[test]
fn rows_written_incrementally_read_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stream.csvy");
    let mut header = Header::new();
    header.insert("title", serde_yaml::Value::from("stream"));

    let options = WriteOptions::default().with_comment("// ");
    let mut writer = Writer::create(&path, &header, &options).expect("create");
    writer.write_row(["k", "v"]).unwrap();
    for i in 0..3 {
        writer.write_row([format!("k{i}"), format!("\"{i}\"")]).unwrap();
    }
    writer.close().expect("close");

    let (rows, read_header) = read_to_rows(&path, &RowReadOptions::default()).expect("rows");
    assert_eq!(read_header, header);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2], vec!["k1", "\"1\""]);
}

#[test]
fn caller_delimiter_is_recorded_in_written_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.csvy");
    let mut header = Header::new();
    header.insert_section(CSV_DIALECT, CsvDialect::default());
    let body = vec![vec!["a".to_string(), "b".to_string()]];

    let options = WriteOptions::default().with_option("delimiter", "\t");
    write(&path, Body::Rows(&body), &header, &options).expect("write");

    let read = read_metadata(&path, &ReadOptions::default()).expect("header");
    assert_eq!(read.section::<CsvDialect>(CSV_DIALECT).unwrap().delimiter, '\t');
    let (rows, _) = read_to_rows(&path, &RowReadOptions::default()).expect("rows");
    assert_eq!(rows, vec![vec!["a", "b"]]);
}

#[test]
fn array_written_then_read_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("matrix.csvy");
    let mut header = Header::new();
    header.insert("title", serde_yaml::Value::from("matrix"));
    header.insert_section(CSV_DIALECT, CsvDialect::excel_tab());
    let array = NumericArray::from_rows(vec![vec![0.5, 1e-3, 7.0], vec![2.0, -4.25, 1e10]])
        .expect("array");

    let options = WriteOptions::default().with_comment("# ");
    write(&path, Body::Array(&array), &header, &options).expect("write");

    let (read, read_header) = read_to_array(&path, &ArrayReadOptions::default()).expect("read");
    assert_eq!(read, array);
    assert_eq!(read_header, csvy_core::validate_read(&header).unwrap());
}
