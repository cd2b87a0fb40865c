//! Writing a header followed by a body.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use csvy_core::{
    CsvOptions, Header, YamlOptions, merge_csv_options_with_dialect, write_header_to_path,
};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde_yaml::Value;

use crate::array::NumericArray;
use crate::error::{IngestError, Result};
use crate::frame::Frame;
use crate::options::{CsvEngineSettings, bool_option, byte_option, csv_settings, overrides};

/// Polars names for the dialect attributes its writer understands.
const WRITE_ALIASES: [(&str, &str); 3] = [
    ("line_terminator", "lineterminator"),
    ("quote_char", "quotechar"),
    ("separator", "delimiter"),
];

/// Body data accepted by [`write`].
#[derive(Debug)]
pub enum Body<'a> {
    /// Rows of fields, written with the `csv` crate.
    Rows(&'a [Vec<String>]),
    /// Named columns, zipped into rows and padded with `fill`.
    Columns {
        columns: &'a [(String, Vec<String>)],
        fill: &'a str,
    },
    /// A numeric array, one row per line.
    Array(&'a NumericArray),
    /// A Polars frame; lazy frames are collected first.
    Frame(Frame),
}

/// Options for [`write`] and [`Writer::create`](crate::Writer::create).
///
/// For row and column bodies `csv_options` keys are the dialect attributes
/// and `flexible`. For frames they are `separator`, `quote_char`,
/// `line_terminator` and `include_header`. Either way they take precedence
/// over the header's `csv_dialect`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Prefix put before every header line.
    pub comment: String,
    pub yaml: YamlOptions,
    pub csv_options: CsvOptions,
    /// Flush after every row written by [`Writer`](crate::Writer).
    pub line_buffered: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            comment: String::new(),
            yaml: YamlOptions::default(),
            csv_options: CsvOptions::new(),
            line_buffered: false,
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn with_yaml(mut self, yaml: YamlOptions) -> Self {
        self.yaml = yaml;
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.csv_options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_line_buffered(mut self, line_buffered: bool) -> Self {
        self.line_buffered = line_buffered;
        self
    }
}

/// Settings of the Polars CSV writer resolved from merged options.
#[derive(Debug, Clone, PartialEq)]
struct FrameWriteSettings {
    separator: u8,
    quote_char: u8,
    line_terminator: String,
    include_header: bool,
}

fn frame_write_settings(options: &CsvOptions) -> Result<FrameWriteSettings> {
    let mut settings = FrameWriteSettings {
        separator: b',',
        quote_char: b'"',
        line_terminator: "\n".to_string(),
        include_header: true,
    };
    for (key, value) in options {
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            "separator" => settings.separator = byte_option(key, value)?,
            "quote_char" => settings.quote_char = byte_option(key, value)?,
            "line_terminator" => {
                settings.line_terminator = value
                    .as_str()
                    .ok_or_else(|| IngestError::InvalidOption {
                        option: key.clone(),
                        reason: "expected a string".to_string(),
                    })?
                    .to_string();
            }
            "include_header" => settings.include_header = bool_option(key, value)?,
            "doublequote" | "escapechar" | "skipinitialspace" => {
                tracing::debug!(option = %key, "no Polars setting, ignoring");
            }
            other => {
                return Err(IngestError::UnsupportedOption {
                    option: other.to_string(),
                    engine: "polars",
                });
            }
        }
    }
    Ok(settings)
}

fn array_to_rows(array: &NumericArray) -> Vec<Vec<String>> {
    array
        .rows()
        .map(|row| row.iter().map(f64::to_string).collect())
        .collect()
}

/// Pads `columns` with `fill` and turns them into rows.
pub(crate) fn columns_to_rows(columns: &[(String, Vec<String>)], fill: &str) -> Vec<Vec<String>> {
    let height = columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
    (0..height)
        .map(|index| {
            columns
                .iter()
                .map(|(_, values)| values.get(index).map_or_else(|| fill.to_string(), Clone::clone))
                .collect()
        })
        .collect()
}

fn append_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| IngestError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
}

fn write_rows(path: &Path, rows: &[Vec<String>], settings: &CsvEngineSettings) -> Result<()> {
    let mut builder = settings.dialect.writer_builder()?;
    builder.flexible(settings.flexible);

    let csv_error = |e: csv::Error| IngestError::CsvWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut writer = builder.from_writer(BufWriter::new(append_file(path)?));
    for row in rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_frame(path: &Path, mut df: DataFrame, settings: FrameWriteSettings) -> Result<()> {
    let mut file = append_file(path)?;
    CsvWriter::new(&mut file)
        .include_header(settings.include_header)
        .with_separator(settings.separator)
        .with_quote_char(settings.quote_char)
        .with_line_terminator(settings.line_terminator)
        .finish(&mut df)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Writes `header` followed by `body` to the file at `path`.
///
/// The file is created or truncated. The header's `csv_dialect` is merged
/// with `options.csv_options` first; the header written reflects any
/// overridden attribute and the body is written with the merged settings.
pub fn write(
    path: impl AsRef<Path>,
    body: Body<'_>,
    header: &Header,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();

    match body {
        Body::Frame(frame) => {
            let df = frame.collect()?;
            let aliases = overrides(&WRITE_ALIASES);
            let outcome =
                merge_csv_options_with_dialect(header, Some(&options.csv_options), Some(&aliases));
            let settings = frame_write_settings(&outcome.options)?;
            write_header_to_path(path, &outcome.header, &options.comment, &options.yaml)?;
            tracing::debug!(path = %path.display(), shape = ?df.shape(), "writing frame body");
            write_frame(path, df, settings)
        }
        Body::Rows(rows) => write_csv_body(path, rows, header, options),
        Body::Columns { columns, fill } => {
            write_csv_body(path, &columns_to_rows(columns, fill), header, options)
        }
        Body::Array(array) => write_csv_body(path, &array_to_rows(array), header, options),
    }
}

fn write_csv_body(
    path: &Path,
    rows: &[Vec<String>],
    header: &Header,
    options: &WriteOptions,
) -> Result<()> {
    let outcome = merge_csv_options_with_dialect(header, Some(&options.csv_options), None);
    let settings = csv_settings(&outcome.options)?;
    write_header_to_path(path, &outcome.header, &options.comment, &options.yaml)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "writing row body");
    write_rows(path, rows, &settings)
}

#[cfg(test)]
mod tests {
    use csvy_core::{CSV_DIALECT, CsvDialect, ReadOptions, read_header};
    use polars::prelude::{IntoLazy, df};
    use tempfile::TempDir;

    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| (*s).to_string()).collect())
            .collect()
    }

    fn titled() -> Header {
        let mut header = Header::new();
        header.insert("title", Value::from("t"));
        header
    }

    #[test]
    fn test_columns_to_rows_pads() {
        let columns = vec![
            ("a".to_string(), vec!["1".to_string(), "2".to_string()]),
            ("b".to_string(), vec!["3".to_string()]),
        ];
        assert_eq!(
            columns_to_rows(&columns, "NA"),
            rows(&[&["1", "3"], &["2", "NA"]])
        );
    }

    #[test]
    fn test_write_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let body = rows(&[&["a", "b"], &["1", "x,y"]]);

        write(&path, Body::Rows(&body), &titled(), &WriteOptions::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "---\ntitle: t\n---\na,b\r\n1,\"x,y\"\r\n");
    }

    #[test]
    fn test_write_rows_with_dialect_and_comment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let mut header = titled();
        header.insert_section(
            CSV_DIALECT,
            CsvDialect {
                delimiter: ';',
                ..CsvDialect::default()
            },
        );
        let body = rows(&[&["a", "b"]]);

        write(
            &path,
            Body::Rows(&body),
            &header,
            &WriteOptions::default().with_comment("# "),
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# ---\n# title: t\n# csv_dialect:\n"));
        assert!(text.ends_with("# ---\na;b\r\n"));
    }

    #[test]
    fn test_caller_option_updates_written_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let mut header = titled();
        header.insert_section(CSV_DIALECT, CsvDialect::default());
        let body = rows(&[&["a", "b"]]);

        let options = WriteOptions::default().with_option("delimiter", "|");
        write(&path, Body::Rows(&body), &header, &options).unwrap();

        let (read, _, _) = read_header(&path, &ReadOptions::default()).unwrap();
        assert_eq!(read.section::<CsvDialect>(CSV_DIALECT).unwrap().delimiter, '|');
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("a|b\r\n"));
        // The caller's header is not modified
        assert_eq!(header.section::<CsvDialect>(CSV_DIALECT).unwrap().delimiter, ',');
    }

    #[test]
    fn test_write_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let columns = vec![
            ("a".to_string(), vec!["1".to_string(), "2".to_string()]),
            ("b".to_string(), vec!["3".to_string()]),
        ];
        let options = WriteOptions::default().with_option("lineterminator", "\n");

        write(
            &path,
            Body::Columns {
                columns: &columns,
                fill: "",
            },
            &Header::new(),
            &options,
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "---\n{}\n---\n1,3\n2,\n");
    }

    #[test]
    fn test_write_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let array = NumericArray::from_rows(vec![vec![1.0, 2.5], vec![-3.0, 0.125]]).unwrap();

        write(
            &path,
            Body::Array(&array),
            &titled(),
            &WriteOptions::default()
                .with_comment("# ")
                .with_option("delimiter", " ")
                .with_option("lineterminator", "\n"),
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "# ---\n# title: t\n# ---\n1 2.5\n-3 0.125\n");
    }

    #[test]
    fn test_write_frame() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let df = df! {
            "A" => [1i64, 2],
            "B" => ["x", "y"],
        }
        .unwrap();

        write(
            &path,
            Body::Frame(Frame::Lazy(df.lazy())),
            &titled(),
            &WriteOptions::default().with_option("separator", ";"),
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "---\ntitle: t\n---\nA;B\n1;x\n2;y\n");
    }

    #[test]
    fn test_invalid_option_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csvy");
        let body = rows(&[&["a"]]);
        let options = WriteOptions::default().with_option("sep", ";");

        let result = write(&path, Body::Rows(&body), &titled(), &options);
        assert!(matches!(result, Err(IngestError::UnsupportedOption { .. })));
        assert!(!path.exists());
    }
}
