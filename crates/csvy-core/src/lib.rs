//! CSVY header handling.
//!
//! A CSVY file is a delimited text file preceded by a comment-prefixed YAML
//! header. This crate locates and parses that header, turns known sections
//! into typed values, and reconciles the declared CSV dialect with the options
//! a caller passes to a body reader.
//!
//! # Features
//!
//! - **Header framing**: detect the comment prefix, scan the marker-bounded block, write it back
//! - **Validator registry**: map section names to typed validators, with a process-wide default
//! - **Built-in sections**: `csv_dialect` ([`CsvDialect`]) and `schema` ([`TableSchema`])
//! - **Option merging**: caller options win over the dialect, with a warning per conflict
//!
//! # Example
//!
//! ```ignore
//! use csvy_core::{CsvDialect, ReadOptions, merge_csv_options_with_dialect, read_header};
//!
//! let (header, skip_lines, comment) = read_header("prices.csv", &ReadOptions::default())?;
//! if let Some(dialect) = header.section::<CsvDialect>("csv_dialect") {
//!     let mut reader = dialect.reader_builder()?;
//! }
//!
//! let outcome = merge_csv_options_with_dialect(&header, None, None);
//! ```

mod error;
mod header;
mod merge;
mod registry;
pub mod validators;

// === Error Types ===
pub use error::{CsvyError, Result};

// === Header Model ===
pub use header::{Header, HeaderValue, validate_read, validate_read_with, validate_write};

// === Header Framing ===
pub use header::{
    DEFAULT_MARKER, HeaderBlock, ReadOptions, YamlOptions, detect_comment_prefix, read_header,
    read_header_from_reader, read_metadata, scan_header_block, write_header, write_header_to_path,
};

// === Validator Registry ===
pub use registry::{
    CSV_DIALECT, RegisteredValidator, SCHEMA, SectionConstructor, ValidatorRegistry,
    default_registry, register_validator, restore_default_registry, snapshot_default_registry,
};

// === Validators ===
pub use validators::{
    Column, ColumnType, CsvDialect, HeaderSection, NativeDialect, TableSchema, Validator,
};

// === Option Merging ===
pub use merge::{CsvOptions, MergeOutcome, OptionConflict, Overrides, merge_csv_options_with_dialect};
