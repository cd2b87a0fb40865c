//! Engine option parsing shared by the readers and writers.

use std::fs::File;
use std::path::Path;

use csvy_core::{CsvDialect, CsvOptions, Overrides};
use serde_yaml::Value;

use crate::error::{IngestError, Result};

/// Builds an override table from `(engine name, dialect attribute)` pairs.
pub(crate) fn overrides(pairs: &[(&str, &str)]) -> Overrides {
    pairs
        .iter()
        .map(|(alias, attribute)| ((*alias).to_string(), (*attribute).to_string()))
        .collect()
}

/// Opens `path` for reading, distinguishing a missing file.
pub(crate) fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn invalid(option: &str, reason: impl Into<String>) -> IngestError {
    IngestError::InvalidOption {
        option: option.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn bool_option(option: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(option, "expected a boolean"))
}

pub(crate) fn usize_option(option: &str, value: &Value) -> Result<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(option, "expected a non-negative integer"))
}

/// Reads a single ASCII character option as a byte.
pub(crate) fn byte_option(option: &str, value: &Value) -> Result<u8> {
    let text = value
        .as_str()
        .ok_or_else(|| invalid(option, "expected a single character"))?;
    match text.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(invalid(option, format!("{text:?} is not a single ASCII character"))),
    }
}

/// Reads a line terminator option; `\r\n` maps to its final `\n`.
pub(crate) fn eol_option(option: &str, value: &Value) -> Result<u8> {
    if value.as_str() == Some("\r\n") {
        return Ok(b'\n');
    }
    byte_option(option, value)
}

/// Settings of the `csv` crate engine resolved from merged options.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CsvEngineSettings {
    pub dialect: CsvDialect,
    pub flexible: bool,
}

/// Resolves merged options into a dialect for the `csv` crate.
///
/// Keys are the six dialect attributes plus `flexible`. `Null` values keep
/// the default.
pub(crate) fn csv_settings(options: &CsvOptions) -> Result<CsvEngineSettings> {
    let mut settings = CsvEngineSettings {
        dialect: CsvDialect::default(),
        flexible: true,
    };
    for (key, value) in options {
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            "flexible" => settings.flexible = bool_option(key, value)?,
            name if CsvDialect::ATTRIBUTES.contains(&name) => {
                settings.dialect.set_attribute(name, value.clone())?;
            }
            other => {
                return Err(IngestError::UnsupportedOption {
                    option: other.to_string(),
                    engine: "csv",
                });
            }
        }
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_option() {
        assert_eq!(byte_option("separator", &Value::from(";")).unwrap(), b';');
        assert!(byte_option("separator", &Value::from(";;")).is_err());
        assert!(byte_option("separator", &Value::from("é")).is_err());
        assert!(byte_option("separator", &Value::from(1)).is_err());
    }

    #[test]
    fn test_eol_option() {
        assert_eq!(eol_option("eol_char", &Value::from("\r\n")).unwrap(), b'\n');
        assert_eq!(eol_option("eol_char", &Value::from("\n")).unwrap(), b'\n');
        assert_eq!(eol_option("eol_char", &Value::from("\r")).unwrap(), b'\r');
    }

    #[test]
    fn test_csv_settings() {
        let options: CsvOptions = [
            ("delimiter".to_string(), Value::from("|")),
            ("escapechar".to_string(), Value::Null),
            ("flexible".to_string(), Value::from(false)),
        ]
        .into_iter()
        .collect();
        let settings = csv_settings(&options).unwrap();
        assert_eq!(settings.dialect.delimiter, '|');
        assert_eq!(settings.dialect.escapechar, None);
        assert!(!settings.flexible);
    }

    #[test]
    fn test_csv_settings_rejects_unknown() {
        let options: CsvOptions = [("sep".to_string(), Value::from(";"))].into_iter().collect();
        let err = csv_settings(&options).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedOption { engine: "csv", .. }));
    }
}
