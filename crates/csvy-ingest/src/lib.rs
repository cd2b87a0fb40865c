//! CSVY body reading and writing.
//!
//! This crate puts a table behind the header handled by `csvy-core`. The
//! header's `csv_dialect` configures the body engine, and caller options
//! override it with a warning.
//!
//! # Features
//!
//! - **Polars Loading**: Read the body into an eager `DataFrame` or a `LazyFrame`
//! - **Row Reading**: Read the body into row lists or named columns with the `csv` crate
//! - **Array Reading**: Read a numeric body into a dense `f64` matrix
//! - **Writing**: Write a header followed by rows, columns, an array or a Polars frame
//! - **Incremental Writing**: Write the header once and stream rows after it
//!
//! # Example
//!
//! ```ignore
//! use csvy_ingest::{Body, PolarsReadOptions, WriteOptions, read_to_dataframe, write};
//!
//! let (df, header) = read_to_dataframe("prices.csvy", &PolarsReadOptions::default())?;
//!
//! let options = WriteOptions::default().with_comment("# ");
//! write("copy.csvy", Body::Frame(df.into()), &header, &options)?;
//! ```

mod array;
mod error;
mod frame;
mod options;
mod rows;
mod write;
mod writer;

// === Error Types ===
pub use error::{IngestError, Result};

// === Polars Reading ===
pub use frame::{
    Frame, MAX_CSV_FILE_SIZE, PolarsReadOptions, check_file_size, check_file_size_with_limit,
    read_to_dataframe, read_to_polars,
};

// === Row Reading ===
pub use rows::{ColumnNames, Columns, RowReadOptions, read_to_columns, read_to_rows};

// === Array Reading ===
pub use array::{ArrayReadOptions, NumericArray, read_to_array};

// === Writing ===
pub use write::{Body, WriteOptions, write};
pub use writer::Writer;
