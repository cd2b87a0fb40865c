//! Reading the body into row lists and column tables with the `csv` crate.

use std::io::BufReader;
use std::path::Path;

use csvy_core::{
    CsvOptions, Header, ReadOptions, merge_csv_options_with_dialect, read_header_from_reader,
};

use crate::error::{IngestError, Result};
use crate::options::{csv_settings, open_file};

/// Options for [`read_to_rows`] and [`read_to_columns`].
///
/// `csv_options` keys are the dialect attributes (`delimiter`, `quotechar`,
/// `escapechar`, `doublequote`, `lineterminator`, `skipinitialspace`) and
/// `flexible`. They take precedence over the header's `csv_dialect`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowReadOptions {
    pub read: ReadOptions,
    pub csv_options: CsvOptions,
}

impl RowReadOptions {
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.read = self.read.with_marker(marker);
        self
    }

    #[must_use]
    pub fn with_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> Self {
        self.csv_options.insert(key.into(), value.into());
        self
    }
}

/// How column names are chosen by [`read_to_columns`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnNames {
    /// `col_0`, `col_1`, ...
    #[default]
    Auto,
    /// Exactly one name per column of the widest row.
    Explicit(Vec<String>),
    /// Take the names from this body row, which is removed from the data.
    Row(usize),
}

/// Column-oriented body: names paired with their values, in column order.
pub type Columns = Vec<(String, Vec<String>)>;

/// Reads the body of a CSVY file as a list of rows.
///
/// The header's `csv_dialect` configures the reader, with `csv_options`
/// overriding it. Rows may differ in length unless `flexible` is false.
/// Returns the rows and the header, updated with any overridden dialect
/// attribute.
pub fn read_to_rows(
    path: impl AsRef<Path>,
    options: &RowReadOptions,
) -> Result<(Vec<Vec<String>>, Header)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(open_file(path)?);
    let (header, skip_lines, _) = read_header_from_reader(&mut reader, &options.read)?;

    let outcome = merge_csv_options_with_dialect(&header, Some(&options.csv_options), None);
    let settings = csv_settings(&outcome.options)?;
    let mut builder = settings.dialect.reader_builder()?;
    builder.has_headers(false).flexible(settings.flexible);

    tracing::debug!(path = %path.display(), skip_lines, "reading CSVY body as rows");

    let mut rows = Vec::new();
    for record in builder.from_reader(reader).records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((rows, outcome.header.into_owned()))
}

/// Reads the body of a CSVY file as named columns.
///
/// Short rows are padded with `fill`.
///
/// # Errors
///
/// - [`IngestError::ColumnCountMismatch`] if the names do not match the widest row
/// - [`IngestError::ColumnNameRow`] if the name row does not exist
pub fn read_to_columns(
    path: impl AsRef<Path>,
    options: &RowReadOptions,
    names: &ColumnNames,
    fill: &str,
) -> Result<(Columns, Header)> {
    let (mut rows, header) = read_to_rows(path, options)?;
    let longest = rows.iter().map(Vec::len).max().unwrap_or(0);

    let names = match names {
        ColumnNames::Auto => (0..longest).map(|i| format!("col_{i}")).collect(),
        ColumnNames::Explicit(names) => names.clone(),
        ColumnNames::Row(row) => {
            if *row >= rows.len() {
                return Err(IngestError::ColumnNameRow {
                    row: *row,
                    rows: rows.len(),
                });
            }
            rows.remove(*row)
        }
    };
    if names.len() != longest {
        return Err(IngestError::ColumnCountMismatch {
            names: names.len(),
            longest,
        });
    }

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let values = rows
                .iter()
                .map(|row| row.get(index).map_or_else(|| fill.to_string(), Clone::clone))
                .collect();
            (name, values)
        })
        .collect();
    Ok((columns, header))
}
