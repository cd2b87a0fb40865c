//! Command implementations behind the `csvy` subcommands.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use csvy_core::{
    CSV_DIALECT, CsvDialect, Header, ReadOptions, SCHEMA, TableSchema, read_header, validate_write,
};
use csvy_ingest::{
    Body, Frame, PolarsReadOptions, RowReadOptions, WriteOptions, read_to_polars, read_to_rows,
    write,
};
use polars::prelude::IdxSize;
use tracing::{debug, info};

/// Output format of the `header` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderFormat {
    #[default]
    Yaml,
    Json,
}

/// Renders the validated header of `path`.
pub fn header_text(path: &Path, marker: &str, format: HeaderFormat) -> Result<String> {
    let options = ReadOptions::default().with_marker(marker);
    let (header, lines, comment) = read_header(path, &options)
        .with_context(|| format!("read header of {}", path.display()))?;
    debug!(lines, comment = %comment, "header read");

    let mapping = validate_write(&header).context("dump header")?;
    let text = match format {
        HeaderFormat::Yaml => serde_yaml::to_string(&mapping).context("render YAML")?,
        HeaderFormat::Json => {
            let mut json = serde_json::to_string_pretty(&mapping).context("render JSON")?;
            json.push('\n');
            json
        }
    };
    Ok(text)
}

/// What `validate` found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub header_lines: usize,
    pub keys: Vec<String>,
    pub delimiter: char,
    pub rows: usize,
    pub columns: usize,
    /// Schema fields missing from the first body row, when a schema is declared.
    pub missing_fields: Vec<String>,
}

impl ValidationSummary {
    pub fn is_clean(&self) -> bool {
        self.missing_fields.is_empty()
    }
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "header: {} lines, keys [{}]", self.header_lines, self.keys.join(", "))?;
        writeln!(
            f,
            "body: {} rows, {} columns, delimiter {:?}",
            self.rows, self.columns, self.delimiter
        )?;
        if !self.missing_fields.is_empty() {
            writeln!(f, "schema fields not in body: {}", self.missing_fields.join(", "))?;
        }
        Ok(())
    }
}

fn delimiter_of(header: &Header) -> char {
    header
        .section::<CsvDialect>(CSV_DIALECT)
        .map_or(',', |dialect| dialect.delimiter)
}

/// Reads the header and the whole body of `path`.
pub fn run_validate(path: &Path, marker: &str) -> Result<ValidationSummary> {
    let read = ReadOptions::default().with_marker(marker);
    let (_, header_lines, _) = read_header(path, &read)
        .with_context(|| format!("read header of {}", path.display()))?;
    let options = RowReadOptions {
        read,
        ..RowReadOptions::default()
    };
    let (rows, header) =
        read_to_rows(path, &options).with_context(|| format!("read body of {}", path.display()))?;

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let missing_fields = match (header.section::<TableSchema>(SCHEMA), rows.first()) {
        (Some(schema), Some(names)) => schema
            .field_names()
            .into_iter()
            .filter(|field| !names.iter().any(|name| name.as_str() == *field))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    info!(path = %path.display(), rows = rows.len(), "validated file");
    Ok(ValidationSummary {
        header_lines,
        keys: header.keys().map(str::to_string).collect(),
        delimiter: delimiter_of(&header),
        rows: rows.len(),
        columns,
        missing_fields,
    })
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Loads the first `rows` body rows of `path` through Polars as a table.
pub fn preview_table(path: &Path, marker: &str, rows: usize) -> Result<Table> {
    let options = PolarsReadOptions::default().with_marker(marker);
    let (frame, _) = read_to_polars(path, &options, false)
        .with_context(|| format!("scan {}", path.display()))?;
    let limit = IdxSize::try_from(rows).unwrap_or(IdxSize::MAX);
    let df = match frame {
        Frame::Lazy(lf) => lf.limit(limit).collect(),
        Frame::Eager(df) => Ok(df.head(Some(rows))),
    }
    .with_context(|| format!("load {}", path.display()))?;

    let mut table = Table::new();
    table.set_header(df.get_column_names_str());
    apply_table_style(&mut table);
    for index in 0..df.height() {
        let mut cells = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let value = column.get(index).context("read cell")?;
            cells.push(value.str_value().into_owned());
        }
        table.add_row(cells);
    }
    Ok(table)
}

/// Settings of the `convert` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub marker: String,
    /// New comment prefix; the input's prefix is kept when `None`.
    pub comment: Option<String>,
    /// New delimiter, recorded in the written `csv_dialect`.
    pub delimiter: Option<char>,
}

/// Rewrites `input` to `output` with a new comment prefix or delimiter.
///
/// Returns the number of body rows written.
pub fn run_convert(input: &Path, output: &Path, options: &ConvertOptions) -> Result<usize> {
    let read = ReadOptions::default().with_marker(&options.marker);
    let (_, _, comment) = read_header(input, &read)
        .with_context(|| format!("read header of {}", input.display()))?;
    let row_options = RowReadOptions {
        read,
        ..RowReadOptions::default()
    };
    let (rows, mut header) = read_to_rows(input, &row_options)
        .with_context(|| format!("read body of {}", input.display()))?;

    let mut write_options = WriteOptions::default()
        .with_comment(options.comment.clone().unwrap_or(comment))
        .with_yaml(csvy_core::YamlOptions::default().with_marker(&options.marker));
    if let Some(delimiter) = options.delimiter {
        if header.section::<CsvDialect>(CSV_DIALECT).is_none() {
            header.insert_section(CSV_DIALECT, CsvDialect::default());
        }
        write_options = write_options.with_option("delimiter", delimiter.to_string());
    }

    write(output, Body::Rows(&rows), &header, &write_options)
        .with_context(|| format!("write {}", output.display()))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        rows = rows.len(),
        "converted file"
    );
    Ok(rows.len())
}
