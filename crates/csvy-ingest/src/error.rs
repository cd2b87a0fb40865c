//! Error types for CSVY body reading and writing.

use std::path::PathBuf;

use csvy_core::CsvyError;
use thiserror::Error;

/// Errors that can occur while reading or writing a CSVY body.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Header Errors ===
    /// The header could not be framed, parsed or validated.
    #[error(transparent)]
    Header(#[from] CsvyError),

    // === File System Errors ===
    /// File not found.
    #[error("CSVY file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the size limit for frame loading.
    #[error("file {path} is too large ({size} bytes, limit {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // === CSV Errors ===
    /// Failed to parse the body.
    #[error("failed to parse CSV body of {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to write the body.
    #[error("failed to write CSV body to {path}: {message}")]
    CsvWrite { path: PathBuf, message: String },

    // === Option Errors ===
    /// The engine has no such option.
    #[error("option '{option}' is not supported by the {engine} engine")]
    UnsupportedOption { option: String, engine: &'static str },

    /// An option value has the wrong type or range.
    #[error("invalid value for option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    // === Column Errors ===
    /// Explicit column names do not match the widest row.
    #[error("the number of column names must be exactly the length of the longest row ({names} != {longest})")]
    ColumnCountMismatch { names: usize, longest: usize },

    /// The row holding column names does not exist.
    #[error("column name row {row} is out of range ({rows} rows)")]
    ColumnNameRow { row: usize, rows: usize },

    // === Array Errors ===
    /// A body field is not a number.
    #[error("value {value:?} at row {row}, column {column} is not a number")]
    NotANumber {
        row: usize,
        column: usize,
        value: String,
    },

    /// A row differs in length from the first row.
    #[error("row {row} has {len} values, expected {expected}")]
    RaggedArray {
        row: usize,
        len: usize,
        expected: usize,
    },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for body operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/file.csv"),
        };
        assert_eq!(err.to_string(), "CSVY file not found: /path/to/file.csv");
    }

    #[test]
    fn test_header_error_is_transparent() {
        let err: IngestError = CsvyError::DuplicateValidator {
            name: "x".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "validator with name 'x' already exists");
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
