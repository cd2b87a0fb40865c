//! CSV dialect section (`csv_dialect`).
//!
//! The dialect describes how the body of the file is tokenised. Quoting style
//! is not part of the header: it is an engine setting, so the native dialect
//! always uses minimal ("necessary") quoting.
//!
//! Building a [`CsvDialect`] only checks attribute types. Any character and
//! any terminator string is a valid header value; the limits of the `csv`
//! crate (ASCII bytes, `\r\n` or a one-byte terminator) are applied by
//! [`CsvDialect::to_native_dialect`] when a body engine is configured.

use csv::{QuoteStyle, ReaderBuilder, Terminator, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::Validator;
use crate::error::{CsvyError, Result};
use crate::registry::CSV_DIALECT;

/// Typed `csv_dialect` header section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvDialect {
    /// Character separating fields.
    pub delimiter: char,
    /// Whether a quote inside a quoted field is written as two quotes.
    pub doublequote: bool,
    /// Character used to escape the quote character when `doublequote` is false.
    pub escapechar: Option<char>,
    /// Line terminator used by writers.
    pub lineterminator: String,
    /// Character used to quote fields.
    pub quotechar: char,
    /// Whether whitespace following the delimiter is ignored.
    pub skipinitialspace: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            doublequote: true,
            escapechar: None,
            lineterminator: "\r\n".to_string(),
            quotechar: '"',
            skipinitialspace: false,
        }
    }
}

/// Record terminator of a native dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// `\r\n` on write; any of `\r`, `\n` or `\r\n` on read.
    Crlf,
    /// A single byte.
    Byte(u8),
}

impl LineTerminator {
    fn to_csv(self) -> Terminator {
        match self {
            LineTerminator::Crlf => Terminator::CRLF,
            LineTerminator::Byte(byte) => Terminator::Any(byte),
        }
    }
}

/// Byte-level dialect consumed by the `csv` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeDialect {
    pub delimiter: u8,
    pub double_quote: bool,
    pub escape: Option<u8>,
    pub terminator: LineTerminator,
    pub quote: Option<u8>,
    pub skip_initial_space: bool,
}

impl NativeDialect {
    /// Spreadsheet-style CSV: comma separated, CRLF line endings.
    pub const EXCEL: Self = Self {
        delimiter: b',',
        double_quote: true,
        escape: None,
        terminator: LineTerminator::Crlf,
        quote: Some(b'"'),
        skip_initial_space: false,
    };

    /// Spreadsheet-style TSV: tab separated, CRLF line endings.
    pub const EXCEL_TAB: Self = Self {
        delimiter: b'\t',
        ..Self::EXCEL
    };

    /// Unix-style CSV: comma separated, LF line endings.
    pub const UNIX: Self = Self {
        terminator: LineTerminator::Byte(b'\n'),
        ..Self::EXCEL
    };

    /// Returns a `csv` reader builder configured with this dialect.
    ///
    /// `skip_initial_space` maps to [`Trim::Fields`], which also strips
    /// trailing whitespace and whitespace inside quoted fields.
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .double_quote(self.double_quote)
            .escape(self.escape)
            .terminator(self.terminator.to_csv())
            .quoting(self.quote.is_some())
            .quote(self.quote.unwrap_or(b'"'));
        // The csv crate has no leading-only trim
        if self.skip_initial_space {
            tracing::warn!("skipinitialspace trims both ends of every field");
            builder.trim(Trim::Fields);
        }
        builder
    }

    /// Returns a `csv` writer builder configured with this dialect.
    pub fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .double_quote(self.double_quote)
            .terminator(self.terminator.to_csv())
            .quote(self.quote.unwrap_or(b'"'))
            .quote_style(QuoteStyle::Necessary);
        if let Some(escape) = self.escape {
            builder.escape(escape);
        }
        builder
    }
}

impl CsvDialect {
    /// Dialect attributes in their fixed order.
    pub const ATTRIBUTES: [&'static str; 6] = [
        "delimiter",
        "doublequote",
        "escapechar",
        "lineterminator",
        "quotechar",
        "skipinitialspace",
    ];

    /// Builds a dialect section by copying the attributes of a native preset.
    pub fn from_native(native: &NativeDialect) -> Self {
        let lineterminator = match native.terminator {
            LineTerminator::Crlf => "\r\n".to_string(),
            LineTerminator::Byte(byte) => char::from(byte).to_string(),
        };
        Self {
            delimiter: char::from(native.delimiter),
            doublequote: native.double_quote,
            escapechar: native.escape.map(char::from),
            lineterminator,
            quotechar: native.quote.map_or('"', char::from),
            skipinitialspace: native.skip_initial_space,
        }
    }

    /// The `excel` preset.
    pub fn excel() -> Self {
        Self::from_native(&NativeDialect::EXCEL)
    }

    /// The `excel_tab` preset.
    pub fn excel_tab() -> Self {
        Self::from_native(&NativeDialect::EXCEL_TAB)
    }

    /// The `unix` preset.
    pub fn unix() -> Self {
        Self::from_native(&NativeDialect::UNIX)
    }

    /// Converts the section to the dialect used by the `csv` crate.
    ///
    /// # Errors
    ///
    /// Returns [`CsvyError::UnsupportedDialect`] for attributes the engine
    /// cannot express (non-ASCII characters, multi-character terminators
    /// other than `\r\n`).
    pub fn to_native_dialect(&self) -> Result<NativeDialect> {
        Ok(NativeDialect {
            delimiter: ascii_byte("delimiter", self.delimiter)?,
            double_quote: self.doublequote,
            escape: self
                .escapechar
                .map(|c| ascii_byte("escapechar", c))
                .transpose()?,
            terminator: terminator(&self.lineterminator)?,
            quote: Some(ascii_byte("quotechar", self.quotechar)?),
            skip_initial_space: self.skipinitialspace,
        })
    }

    /// Returns a `csv` reader builder for this dialect.
    pub fn reader_builder(&self) -> Result<ReaderBuilder> {
        Ok(self.to_native_dialect()?.reader_builder())
    }

    /// Returns a `csv` writer builder for this dialect.
    pub fn writer_builder(&self) -> Result<WriterBuilder> {
        Ok(self.to_native_dialect()?.writer_builder())
    }

    /// Returns the value of a dialect attribute by name.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "delimiter" => Value::String(self.delimiter.to_string()),
            "doublequote" => Value::Bool(self.doublequote),
            "escapechar" => self
                .escapechar
                .map_or(Value::Null, |c| Value::String(c.to_string())),
            "lineterminator" => Value::String(self.lineterminator.clone()),
            "quotechar" => Value::String(self.quotechar.to_string()),
            "skipinitialspace" => Value::Bool(self.skipinitialspace),
            _ => return None,
        };
        Some(value)
    }

    /// Sets a dialect attribute by name, type-checking the result.
    ///
    /// # Errors
    ///
    /// Returns [`CsvyError::Validation`] if the attribute is unknown or the
    /// value does not fit it. `self` is unchanged on error.
    pub fn set_attribute(&mut self, name: &str, value: Value) -> Result<()> {
        if !Self::ATTRIBUTES.contains(&name) {
            return Err(CsvyError::Validation {
                section: CSV_DIALECT.to_string(),
                message: format!("unknown dialect attribute '{name}'"),
            });
        }
        let mut mapping = self.to_mapping()?;
        mapping.insert(Value::String(name.to_string()), value);
        *self = Self::from_mapping(CSV_DIALECT, mapping)?;
        Ok(())
    }
}

impl Validator for CsvDialect {}

fn ascii_byte(attribute: &'static str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(CsvyError::UnsupportedDialect {
            attribute,
            reason: format!("{c:?} is not an ASCII character"),
        })
    }
}

fn terminator(lineterminator: &str) -> Result<LineTerminator> {
    if lineterminator == "\r\n" {
        return Ok(LineTerminator::Crlf);
    }
    let mut chars = lineterminator.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(LineTerminator::Byte(ascii_byte("lineterminator", c)?)),
        _ => Err(CsvyError::UnsupportedDialect {
            attribute: "lineterminator",
            reason: format!("{lineterminator:?} must be \"\\r\\n\" or a single character"),
        }),
    }
}
