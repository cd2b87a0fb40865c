//! Locating, parsing and emitting the comment-prefixed YAML header block.
//!
//! A CSVY file starts with a block bounded by two marker lines:
//!
//! ```text
//! # ---
//! # name: oil prices
//! # csv_dialect:
//! #   delimiter: ','
//! # ---
//! Date,WTI
//! ```
//!
//! Whatever precedes the marker on the first line is the comment prefix of
//! the whole block. Both marker lines carry that prefix. On read the literal
//! prefix is stripped from every line in between; lines whose trailing
//! whitespace was lost (`#` for a `# ` prefix) are stripped of the trimmed
//! prefix instead. Content characters that happen to match the prefix are
//! never removed.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::{Header, validate_read, validate_write};
use crate::error::{CsvyError, Result};

/// Marker bounding the header block unless configured otherwise.
pub const DEFAULT_MARKER: &str = "---";

/// Options for reading a header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Marker bounding the header block.
    pub marker: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

/// Options for emitting a header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlOptions {
    /// Sort mapping keys recursively; insertion order is kept otherwise.
    pub sort_keys: bool,
    /// Marker bounding the header block.
    pub marker: String,
}

impl Default for YamlOptions {
    fn default() -> Self {
        Self {
            sort_keys: false,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl YamlOptions {
    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }
}

/// Raw result of scanning a header block, before YAML parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    /// De-prefixed YAML text between the marker lines.
    pub yaml: String,
    /// Lines consumed, both marker lines included.
    pub line_count: usize,
    /// Comment prefix detected on the first line.
    pub comment: String,
}

/// Returns the comment prefix of the header's first line.
///
/// The prefix is empty if the line starts with `marker`, otherwise it is
/// everything before the marker's first occurrence.
///
/// # Errors
///
/// Returns [`CsvyError::MarkerNotFound`] if `marker` does not occur in `line`.
pub fn detect_comment_prefix(line: &str, marker: &str) -> Result<String> {
    match line.find(marker) {
        Some(index) => Ok(line[..index].to_string()),
        None => Err(CsvyError::MarkerNotFound {
            marker: marker.to_string(),
            line: line.trim_end_matches(['\r', '\n']).to_string(),
        }),
    }
}

/// Strips the comment prefix from one header line.
fn strip_comment<'a>(line: &'a str, comment: &str) -> &'a str {
    line.strip_prefix(comment)
        .or_else(|| line.strip_prefix(comment.trim_end()))
        .unwrap_or(line)
}

/// Scans the header block at the start of `reader`.
///
/// Reading stops right after the closing marker line, so the reader is left
/// positioned at the first body line.
///
/// # Errors
///
/// - [`CsvyError::MarkerNotFound`] if the first line lacks the marker
/// - [`CsvyError::UnterminatedHeader`] if input ends before the closing marker
/// - [`CsvyError::Io`] on read failure
pub fn scan_header_block<R: BufRead>(mut reader: R, marker: &str) -> Result<HeaderBlock> {
    let mut yaml = String::new();
    let mut comment = String::new();
    let mut marker_line = String::new();
    let mut line_count = 0usize;
    let mut markers = 0usize;
    let mut buffer = String::new();

    loop {
        buffer.clear();
        if reader.read_line(&mut buffer)? == 0 {
            break;
        }
        let mut line = buffer.as_str();
        if line_count == 0 {
            line = line.strip_prefix('\u{feff}').unwrap_or(line);
            comment = detect_comment_prefix(line, marker)?;
            marker_line = format!("{comment}{marker}");
        }
        line_count += 1;

        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        if content == marker_line {
            markers += 1;
            tracing::trace!(line = line_count, markers, "header marker line");
            if markers == 2 {
                tracing::debug!(
                    lines = line_count,
                    comment = %comment,
                    "scanned header block"
                );
                return Ok(HeaderBlock {
                    yaml,
                    line_count,
                    comment,
                });
            }
            continue;
        }

        yaml.push_str(strip_comment(content, &comment));
        yaml.push('\n');
    }

    if line_count == 0 {
        return Err(CsvyError::MarkerNotFound {
            marker: marker.to_string(),
            line: String::new(),
        });
    }
    Err(CsvyError::UnterminatedHeader {
        marker: marker_line,
        lines: line_count,
    })
}

/// Reads and validates the header at the start of `reader`.
///
/// Returns the validated header, the number of lines it occupies and the
/// detected comment prefix.
pub fn read_header_from_reader<R: BufRead>(
    reader: R,
    options: &ReadOptions,
) -> Result<(Header, usize, String)> {
    let block = scan_header_block(reader, &options.marker)?;
    let header = validate_read(&Header::from_yaml_str(&block.yaml)?)?;
    Ok((header, block.line_count, block.comment))
}

/// Reads and validates the header of the file at `path`.
///
/// See [`read_header_from_reader`].
pub fn read_header(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<(Header, usize, String)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CsvyError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    read_header_from_reader(BufReader::new(file), options)
}

/// Reads only the validated header of the file at `path`.
pub fn read_metadata(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Header> {
    read_header(path, options).map(|(header, _, _)| header)
}

fn sort_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

fn sort_value(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(sort_mapping(mapping)),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}

fn sort_mapping(mapping: Mapping) -> Mapping {
    let mut entries: Vec<(Value, Value)> = mapping.into_iter().collect();
    entries.sort_by_key(|(key, _)| sort_key(key));
    entries
        .into_iter()
        .map(|(key, value)| (key, sort_value(value)))
        .collect()
}

/// Writes `header` as a comment-prefixed YAML block.
///
/// Typed sections are dumped to their plain mappings first. Every line,
/// both markers included, starts with `comment`. The writer is flushed but
/// not closed.
pub fn write_header<W: Write>(
    writer: &mut W,
    header: &Header,
    comment: &str,
    options: &YamlOptions,
) -> Result<()> {
    let mut mapping = validate_write(&validate_read(header)?)?;
    if options.sort_keys {
        mapping = sort_mapping(mapping);
    }
    let text = serde_yaml::to_string(&mapping)?;

    writeln!(writer, "{comment}{}", options.marker)?;
    for line in text.lines() {
        writeln!(writer, "{comment}{line}")?;
    }
    writeln!(writer, "{comment}{}", options.marker)?;
    writer.flush()?;
    tracing::debug!(keys = header.len(), comment, "wrote header block");
    Ok(())
}

/// Creates (or truncates) the file at `path` and writes `header` into it.
pub fn write_header_to_path(
    path: impl AsRef<Path>,
    header: &Header,
    comment: &str,
    options: &YamlOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| CsvyError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    write_header(&mut writer, header, comment, options).map_err(|e| match e {
        CsvyError::Io(source) => CsvyError::FileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}
