//! Reading a purely numeric body into a dense array.

use std::io::BufReader;
use std::path::Path;

use csvy_core::{
    CsvOptions, Header, ReadOptions, merge_csv_options_with_dialect, read_header_from_reader,
};
use serde_yaml::Value;

use crate::error::{IngestError, Result};
use crate::options::{csv_settings, open_file, usize_option};

/// Comment character used when the header has no comment prefix.
const DEFAULT_COMMENT: u8 = b'#';

/// A dense, row-major matrix of `f64` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericArray {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

impl NumericArray {
    /// Builds an array from rows of equal length.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::RaggedArray`] if a row differs in length from
    /// the first one.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * columns);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(IngestError::RaggedArray {
                    row: index,
                    len: row.len(),
                    expected: columns,
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            values,
        })
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row < self.rows && column < self.columns {
            self.values.get(row * self.columns + column).copied()
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row < self.rows {
            let start = row * self.columns;
            self.values.get(start..start + self.columns)
        } else {
            None
        }
    }

    /// Iterates over the rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).filter_map(|row| self.row(row))
    }

    /// Copies one column out of the array.
    pub fn column(&self, column: usize) -> Option<Vec<f64>> {
        (column < self.columns).then(|| {
            self.values
                .iter()
                .skip(column)
                .step_by(self.columns)
                .copied()
                .collect()
        })
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Options for [`read_to_array`].
///
/// `csv_options` keys are the dialect attributes plus `skip_rows`, the number
/// of body rows (a column name row, say) to drop before parsing numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayReadOptions {
    pub read: ReadOptions,
    pub csv_options: CsvOptions,
}

impl ArrayReadOptions {
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
}

/// Reads a numeric body into a [`NumericArray`].
///
/// Lines starting with the first character of the header's comment prefix
/// (`#` when the header is not commented) are skipped, as are empty lines.
/// Fields are trimmed before parsing.
///
/// # Errors
///
/// - [`IngestError::NotANumber`] if a field does not parse as a float
/// - [`IngestError::RaggedArray`] if rows differ in length
pub fn read_to_array(
    path: impl AsRef<Path>,
    options: &ArrayReadOptions,
) -> Result<(NumericArray, Header)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(open_file(path)?);
    let (header, skip_lines, comment) = read_header_from_reader(&mut reader, &options.read)?;

    let mut csv_options = options.csv_options.clone();
    let skip_rows = match csv_options.remove("skip_rows") {
        Some(value) if !value.is_null() => usize_option("skip_rows", &value)?,
        _ => 0,
    };
    let comment_char = comment
        .chars()
        .next()
        .and_then(|c| u8::try_from(c).ok())
        .filter(u8::is_ascii)
        .unwrap_or(DEFAULT_COMMENT);

    let outcome = merge_csv_options_with_dialect(&header, Some(&csv_options), None);
    let settings = csv_settings(&outcome.options)?;
    let mut builder = settings.dialect.reader_builder()?;
    builder
        .has_headers(false)
        .flexible(true)
        .comment(Some(comment_char));

    tracing::debug!(
        path = %path.display(),
        skip_lines,
        skip_rows,
        "reading CSVY body as an array"
    );

    let mut rows = Vec::new();
    for (index, record) in builder.from_reader(reader).records().skip(skip_rows).enumerate() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let row = record
            .iter()
            .enumerate()
            .map(|(column, field)| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| IngestError::NotANumber {
                        row: index,
                        column,
                        value: field.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok((NumericArray::from_rows(rows)?, outcome.header.into_owned()))
}
