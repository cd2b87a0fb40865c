//! Read and write transforms between plain and typed headers.

use serde_yaml::{Mapping, Value};

use super::{Header, HeaderValue};
use crate::error::{CsvyError, Result, value_kind};
use crate::registry::{ValidatorRegistry, default_registry};

/// Types every registered section of `header` using the default registry.
///
/// See [`validate_read_with`].
pub fn validate_read(header: &Header) -> Result<Header> {
    validate_read_with(&default_registry(), header)
}

/// Types every registered section of `header`.
///
/// Each key with a registered validator is rebuilt from its plain mapping.
/// A section that is already typed is dumped first and rebuilt, so a typed
/// value mutated into an invalid state fails here. Unregistered keys pass
/// through, with any typed value flattened to its mapping.
///
/// # Errors
///
/// - [`CsvyError::SectionNotMapping`] if a registered key holds a non-mapping
/// - [`CsvyError::Validation`] if a section fails its validator
pub fn validate_read_with(registry: &ValidatorRegistry, header: &Header) -> Result<Header> {
    let mut validated = Header::new();
    for (key, value) in header.iter() {
        let value = match registry.lookup(key) {
            Some(validator) => {
                let mapping = match value {
                    HeaderValue::Plain(Value::Mapping(mapping)) => mapping.clone(),
                    HeaderValue::Plain(other) => {
                        return Err(CsvyError::SectionNotMapping {
                            key: key.to_string(),
                            found: value_kind(other),
                        });
                    }
                    HeaderValue::Section(section) => section.dump()?,
                };
                tracing::trace!(
                    section = key,
                    validator = validator.type_name(),
                    "validating header section"
                );
                HeaderValue::Section(validator.construct(key, mapping)?)
            }
            None => HeaderValue::Plain(value.to_value()?),
        };
        validated.insert(key, value);
    }
    Ok(validated)
}

/// Flattens every typed section of `header` to its plain mapping.
pub fn validate_write(header: &Header) -> Result<Mapping> {
    header.to_mapping()
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::registry::{CSV_DIALECT, SCHEMA};
    use crate::validators::{CsvDialect, TableSchema, Validator};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Positive {
        value: i64,
    }

    impl Validator for Positive {
        fn validate(&self) -> std::result::Result<(), String> {
            if self.value > 0 {
                Ok(())
            } else {
                Err(format!("value must be positive, got {}", self.value))
            }
        }
    }

    fn header(yaml: &str) -> Header {
        Header::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_registered_sections_become_typed() {
        let read = validate_read(&header(
            "csv_dialect:\n  delimiter: ';'\nschema:\n  fields:\n    - name: a\nauthor: me\n",
        ))
        .unwrap();
        assert_eq!(read.section::<CsvDialect>(CSV_DIALECT).unwrap().delimiter, ';');
        assert!(read.section::<TableSchema>(SCHEMA).is_some());
        assert_eq!(
            read.get("author").unwrap().as_plain(),
            Some(&Value::from("me"))
        );
    }

    #[test]
    fn test_section_must_be_mapping() {
        let err = validate_read(&header("csv_dialect: 42\n")).unwrap_err();
        match err {
            CsvyError::SectionNotMapping { key, found } => {
                assert_eq!(key, "csv_dialect");
                assert_eq!(found, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unregistered_typed_value_is_flattened() {
        let registry = ValidatorRegistry::new();
        let mut typed = Header::new();
        typed.insert_section("positive", Positive { value: 3 });

        let read = validate_read_with(&registry, &typed).unwrap();
        let mut expected = Mapping::new();
        expected.insert("value".into(), 3.into());
        assert_eq!(
            read.get("positive").unwrap().as_plain(),
            Some(&Value::Mapping(expected))
        );
    }

    #[test]
    fn test_isolated_registry() {
        let mut registry = ValidatorRegistry::new();
        registry.register::<Positive>("positive", false).unwrap();

        let read = validate_read_with(&registry, &header("positive:\n  value: 5\ncsv_dialect: 1\n"))
            .unwrap();
        assert_eq!(read.section::<Positive>("positive").unwrap().value, 5);
        // csv_dialect is not registered in this registry
        assert_eq!(read.get("csv_dialect").unwrap().as_plain(), Some(&Value::from(1)));

        let err = validate_read_with(&registry, &header("positive:\n  value: -1\n")).unwrap_err();
        assert!(matches!(err, CsvyError::Validation { ref section, .. } if section == "positive"));
    }

    #[test]
    fn test_revalidation_catches_mutation() {
        let mut registry = ValidatorRegistry::new();
        registry.register::<Positive>("positive", false).unwrap();
        let mut read = validate_read_with(&registry, &header("positive:\n  value: 5\n")).unwrap();

        read.section_mut::<Positive>("positive").unwrap().value = 0;
        assert!(validate_read_with(&registry, &read).is_err());
    }

    #[test]
    fn test_write_flattens_sections() {
        let original = header("csv_dialect:\n  delimiter: '|'\nnote: hi\n");
        let read = validate_read(&original).unwrap();
        let written = validate_write(&read).unwrap();
        assert_eq!(written.get("note"), Some(&Value::from("hi")));
        let dialect = written.get("csv_dialect").unwrap();
        assert_eq!(dialect.get("delimiter"), Some(&Value::from("|")));
        assert_eq!(dialect.get("lineterminator"), Some(&Value::from("\r\n")));
    }
}
