//! Reading the body into Polars frames.

use std::path::Path;

use csvy_core::{CsvOptions, Header, ReadOptions, merge_csv_options_with_dialect, read_header};
use polars::prelude::*;
use serde_yaml::Value;

use crate::error::{IngestError, Result};
use crate::options::{bool_option, byte_option, eol_option, overrides, usize_option};

/// Maximum file size for frame loading (500 MB default).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Polars names for the dialect attributes it understands.
const READ_ALIASES: [(&str, &str); 3] = [
    ("eol_char", "lineterminator"),
    ("quote_char", "quotechar"),
    ("separator", "delimiter"),
];

/// Dialect attributes Polars has no setting for.
const IGNORED_ATTRIBUTES: [&str; 3] = ["doublequote", "escapechar", "skipinitialspace"];

/// Check file size before loading.
pub fn check_file_size(path: &Path) -> Result<()> {
    check_file_size_with_limit(path, MAX_CSV_FILE_SIZE)
}

/// Check file size against a custom limit.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }

    Ok(())
}

/// Options for [`read_to_polars`].
///
/// `csv_options` accepts `separator`, `quote_char`, `eol_char`, `has_header`,
/// `infer_schema_length` and `ignore_errors`. The first three take precedence
/// over the header's `csv_dialect`. `skip_rows` and `comment_prefix` are
/// always derived from the header and caller values for them are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarsReadOptions {
    pub read: ReadOptions,
    pub csv_options: CsvOptions,
    pub max_file_size: u64,
}

impl Default for PolarsReadOptions {
    fn default() -> Self {
        Self {
            read: ReadOptions::default(),
            csv_options: CsvOptions::new(),
            max_file_size: MAX_CSV_FILE_SIZE,
        }
    }
}

impl PolarsReadOptions {
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.read = self.read.with_marker(marker);
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.csv_options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}

/// A Polars frame, either still lazy or already materialised.
#[derive(Clone)]
pub enum Frame {
    Lazy(LazyFrame),
    Eager(DataFrame),
}

impl Frame {
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    /// Materialises the frame, running the query if it is lazy.
    pub fn collect(self) -> Result<DataFrame> {
        match self {
            Self::Lazy(lf) => Ok(lf.collect()?),
            Self::Eager(df) => Ok(df),
        }
    }
}

impl From<DataFrame> for Frame {
    fn from(df: DataFrame) -> Self {
        Self::Eager(df)
    }
}

impl From<LazyFrame> for Frame {
    fn from(lf: LazyFrame) -> Self {
        Self::Lazy(lf)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lazy(_) => f.write_str("Frame::Lazy(..)"),
            Self::Eager(df) => f.debug_tuple("Frame::Eager").field(&df.shape()).finish(),
        }
    }
}

/// Settings of the Polars CSV scanner resolved from merged options.
#[derive(Debug, Clone, PartialEq)]
struct ScanSettings {
    separator: u8,
    quote_char: Option<u8>,
    eol_char: u8,
    has_header: bool,
    infer_schema_length: Option<usize>,
    ignore_errors: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            separator: b',',
            quote_char: Some(b'"'),
            eol_char: b'\n',
            has_header: true,
            infer_schema_length: Some(100),
            ignore_errors: false,
        }
    }
}

fn scan_settings(options: &CsvOptions) -> Result<ScanSettings> {
    let mut settings = ScanSettings::default();
    for (key, value) in options {
        match key.as_str() {
            "separator" if !value.is_null() => settings.separator = byte_option(key, value)?,
            "quote_char" if value.is_null() => settings.quote_char = None,
            "quote_char" => settings.quote_char = Some(byte_option(key, value)?),
            "eol_char" if !value.is_null() => settings.eol_char = eol_option(key, value)?,
            "has_header" => settings.has_header = bool_option(key, value)?,
            "infer_schema_length" if value.is_null() => settings.infer_schema_length = None,
            "infer_schema_length" => {
                settings.infer_schema_length = Some(usize_option(key, value)?);
            }
            "ignore_errors" => settings.ignore_errors = bool_option(key, value)?,
            "separator" | "eol_char" => {}
            "skip_rows" | "comment_prefix" => {
                tracing::debug!(option = %key, "option is derived from the header, ignoring");
            }
            name if IGNORED_ATTRIBUTES.contains(&name) => {
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

/// Reads a CSVY file into a Polars frame.
///
/// The header is read and validated first. The body scan skips the header
/// lines and treats lines starting with the first character of the header's
/// comment prefix as comments. With `eager` the frame is collected before
/// returning.
///
/// Returns the frame and the header, updated with any overridden dialect
/// attribute.
pub fn read_to_polars(
    path: impl AsRef<Path>,
    options: &PolarsReadOptions,
    eager: bool,
) -> Result<(Frame, Header)> {
    let path = path.as_ref();
    check_file_size_with_limit(path, options.max_file_size)?;

    let (header, skip_lines, comment) = read_header(path, &options.read)?;
    let aliases = overrides(&READ_ALIASES);
    let outcome =
        merge_csv_options_with_dialect(&header, Some(&options.csv_options), Some(&aliases));
    let settings = scan_settings(&outcome.options)?;
    let comment_prefix = comment.chars().next().map(|c| PlSmallStr::from(c.to_string()));

    tracing::debug!(
        path = %path.display(),
        skip_lines,
        comment_prefix = ?comment_prefix,
        "scanning CSVY body"
    );

    let path_str = path.to_string_lossy();
    let pl_path = PlPath::new(&path_str);
    let lf = LazyCsvReader::new(pl_path)
        .with_has_header(settings.has_header)
        .with_skip_lines(skip_lines)
        .with_separator(settings.separator)
        .with_quote_char(settings.quote_char)
        .with_eol_char(settings.eol_char)
        .with_comment_prefix(comment_prefix)
        .with_infer_schema_length(settings.infer_schema_length)
        .with_ignore_errors(settings.ignore_errors)
        .finish()?;

    let frame = if eager {
        Frame::Eager(lf.collect()?)
    } else {
        Frame::Lazy(lf)
    };
    Ok((frame, outcome.header.into_owned()))
}

/// Reads a CSVY file into a materialised [`DataFrame`].
pub fn read_to_dataframe(
    path: impl AsRef<Path>,
    options: &PolarsReadOptions,
) -> Result<(DataFrame, Header)> {
    let (frame, header) = read_to_polars(path, options, true)?;
    Ok((frame.collect()?, header))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use csvy_core::{CSV_DIALECT, CsvDialect};
    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_csvy(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_check_file_size_within_limit() {
        let file = create_temp_csvy("---\n---\na\n1\n");
        assert!(check_file_size_with_limit(file.path(), 1000).is_ok());
    }

    #[test]
    fn test_check_file_size_exceeds_limit() {
        let file = create_temp_csvy("---\n---\na\n1\n");
        let result = check_file_size_with_limit(file.path(), 2);
        assert!(matches!(result, Err(IngestError::FileTooLarge { .. })));
    }

    #[test]
    fn test_check_file_size_not_found() {
        let result = check_file_size(Path::new("/nonexistent/file.csvy"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_read_eager() {
        let file = create_temp_csvy("---\ntitle: t\n---\nA,B\n1,x\n2,y\n");
        let (df, header) = read_to_dataframe(file.path(), &PolarsReadOptions::default()).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.get_column_names_str(), vec!["A", "B"]);
        assert_eq!(header.len(), 1);
    }

    #[test]
    fn test_read_lazy() {
        let file = create_temp_csvy("# ---\n# title: t\n# ---\nA\n1\n# skipped\n2\n");
        let (frame, _) = read_to_polars(file.path(), &PolarsReadOptions::default(), false).unwrap();
        assert!(frame.is_lazy());
        let df = frame.collect().unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_read_uses_header_dialect() {
        let file = create_temp_csvy("---\ncsv_dialect:\n  delimiter: ';'\n---\nA;B\n1;2\n");
        let (df, header) = read_to_dataframe(file.path(), &PolarsReadOptions::default()).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(header.section::<CsvDialect>(CSV_DIALECT).unwrap().delimiter, ';');
    }

    #[test]
    fn test_separator_overrides_dialect() {
        let file = create_temp_csvy("---\ncsv_dialect:\n  delimiter: ';'\n---\nA|B;C\n1|2;3\n");
        let options = PolarsReadOptions::default().with_option("separator", "|");
        let (df, header) = read_to_dataframe(file.path(), &options).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["A", "B;C"]);
        assert_eq!(header.section::<CsvDialect>(CSV_DIALECT).unwrap().delimiter, '|');
    }

    #[test]
    fn test_caller_skip_rows_is_ignored() {
        let file = create_temp_csvy("---\n---\nA\n1\n2\n");
        let options = PolarsReadOptions::default().with_option("skip_rows", 5);
        let (df, _) = read_to_dataframe(file.path(), &options).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_unknown_option() {
        let file = create_temp_csvy("---\n---\nA\n1\n");
        let options = PolarsReadOptions::default().with_option("delimiter", ";");
        let result = read_to_polars(file.path(), &options, true);
        assert!(matches!(
            result,
            Err(IngestError::UnsupportedOption {
                engine: "polars",
                ..
            })
        ));
    }

    #[test]
    fn test_scan_settings() {
        let options: CsvOptions = [
            ("quote_char".to_string(), Value::Null),
            ("eol_char".to_string(), Value::from("\r\n")),
            ("infer_schema_length".to_string(), Value::from(10)),
            ("escapechar".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        let settings = scan_settings(&options).unwrap();
        assert_eq!(settings.quote_char, None);
        assert_eq!(settings.eol_char, b'\n');
        assert_eq!(settings.infer_schema_length, Some(10));
        assert_eq!(settings.separator, b',');
    }
}
