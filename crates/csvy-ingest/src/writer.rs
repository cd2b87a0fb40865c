//! Incremental row writer.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csvy_core::{CsvyError, Header, merge_csv_options_with_dialect, write_header};

use crate::error::{IngestError, Result};
use crate::options::csv_settings;
use crate::write::WriteOptions;

/// Writes a header once, then body rows as they arrive.
///
/// Rows are written with the merged dialect of the header and the caller
/// options. The file is flushed when the writer is closed or dropped.
pub struct Writer {
    path: PathBuf,
    inner: csv::Writer<BufWriter<File>>,
    line_buffered: bool,
    rows_written: usize,
}

impl Writer {
    /// Creates (or truncates) the file at `path` and writes `header` to it.
    pub fn create(path: impl AsRef<Path>, header: &Header, options: &WriteOptions) -> Result<Self> {
        let path = path.as_ref();
        let outcome = merge_csv_options_with_dialect(header, Some(&options.csv_options), None);
        let settings = csv_settings(&outcome.options)?;

        let file = File::create(path).map_err(|e| IngestError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut buffer = BufWriter::new(file);
        write_header(&mut buffer, &outcome.header, &options.comment, &options.yaml).map_err(
            |e| match e {
                CsvyError::Io(source) => IngestError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                },
                other => other.into(),
            },
        )?;

        let mut builder = settings.dialect.writer_builder()?;
        builder.flexible(settings.flexible);
        tracing::debug!(path = %path.display(), "opened CSVY writer");

        Ok(Self {
            path: path.to_path_buf(),
            inner: builder.from_writer(buffer),
            line_buffered: options.line_buffered,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Writes one row.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner
            .write_record(row)
            .map_err(|e| IngestError::CsvWrite {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        self.rows_written += 1;
        if self.line_buffered {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes every row of `rows`.
    pub fn write_rows<R, I, T>(&mut self, rows: R) -> Result<()>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| IngestError::FileWrite {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Flushes and closes the file, reporting any error the drop would hide.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("path", &self.path)
            .field("line_buffered", &self.line_buffered)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use csvy_core::{CSV_DIALECT, CsvDialect};
    use serde_yaml::Value;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_incremental_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csvy");
        let mut header = Header::new();
        header.insert("title", Value::from("log"));

        let mut writer = Writer::create(&path, &header, &WriteOptions::default()).unwrap();
        writer.write_row(["a", "b"]).unwrap();
        writer.write_rows([["1", "2"], ["3", "4"]]).unwrap();
        assert_eq!(writer.rows_written(), 3);
        writer.close().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "---\ntitle: log\n---\na,b\r\n1,2\r\n3,4\r\n");
    }

    #[test]
    fn test_line_buffered_rows_are_visible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csvy");
        let mut header = Header::new();
        header.insert_section(
            CSV_DIALECT,
            CsvDialect {
                delimiter: '\t',
                ..CsvDialect::default()
            },
        );
        let options = WriteOptions::default()
            .with_comment("#")
            .with_line_buffered(true);

        let mut writer = Writer::create(&path, &header, &options).unwrap();
        writer.write_row(["x", "y"]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("#---\n#csv_dialect:\n"));
        assert!(text.ends_with("#---\nx\ty\r\n"));
        drop(writer);
    }

    #[test]
    fn test_create_rejects_unknown_option() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csvy");
        let options = WriteOptions::default().with_option("separator", ";");
        let result = Writer::create(&path, &Header::new(), &options);
        assert!(matches!(result, Err(IngestError::UnsupportedOption { .. })));
        assert!(!path.exists());
    }
}
