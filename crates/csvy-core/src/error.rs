//! Error types for CSVY header handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while framing, validating or merging a CSVY header.
#[derive(Debug, Error)]
pub enum CsvyError {
    // === Framing Errors ===
    /// The first line of the file does not contain the header marker.
    #[error("yaml header marker '{marker}' not found in line '{line}'")]
    MarkerNotFound { marker: String, line: String },

    /// The input ended before the closing marker line was found.
    #[error("header block is not terminated: expected a closing '{marker}' line after {lines} lines")]
    UnterminatedHeader { marker: String, lines: usize },

    // === Parse Errors ===
    /// The header block is not valid YAML.
    #[error("failed to parse yaml header: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The header block parsed to something other than a mapping.
    #[error("yaml header must be a mapping, found {found}")]
    HeaderNotMapping { found: &'static str },

    /// A top-level header key is not a string.
    #[error("header keys must be strings, found {found}")]
    NonStringKey { found: &'static str },

    // === Validation Errors ===
    /// A registered section holds something other than a mapping.
    #[error("value for '{key}' must be a mapping, not a '{found}'")]
    SectionNotMapping { key: String, found: &'static str },

    /// A registered section failed its validator's field constraints.
    #[error("invalid '{section}' section: {message}")]
    Validation { section: String, message: String },

    /// A validator dump did not produce a mapping.
    #[error("validator '{section}' did not dump to a mapping")]
    DumpNotMapping { section: String },

    // === Registry Errors ===
    /// A validator with this name is already registered.
    #[error("validator with name '{name}' already exists")]
    DuplicateValidator { name: String },

    // === Dialect Errors ===
    /// A dialect attribute cannot be expressed by the native CSV engine.
    #[error("dialect attribute '{attribute}' is not supported: {reason}")]
    UnsupportedDialect {
        attribute: &'static str,
        reason: String,
    },

    // === I/O Errors ===
    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error on a caller-supplied stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CSVY header operations.
pub type Result<T> = std::result::Result<T, CsvyError>;

/// Returns the YAML node kind of a value, used in error messages.
pub(crate) fn value_kind(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
