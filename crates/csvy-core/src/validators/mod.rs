//! Typed validators for known header sections.
//!
//! A header section such as `csv_dialect` or `schema` is a plain YAML mapping
//! in the file. A [`Validator`] turns that mapping into a strongly typed value
//! and dumps it back. Once constructed, a validator lives in the header as a
//! [`HeaderSection`] trait object, which is the capability interface the
//! validation pipeline works against.

use std::any::Any;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::error::{CsvyError, Result};

pub mod dialect;
pub mod schema;

pub use dialect::{CsvDialect, LineTerminator, NativeDialect};
pub use schema::{
    BooleanColumn, Column, ColumnCommon, ColumnType, Constraints, DateTimeColumn, DateTimeFormat,
    DefaultColumn, DefaultFormat, GeoJsonColumn, GeoJsonFormat, GeopointColumn, GeopointFormat,
    IntegerColumn, NumberColumn, StringColumn, StringFormat, TableSchema,
};

/// A typed header section that can be built from and dumped to a mapping.
///
/// The serde bounds are the capability set a registered validator must have:
/// deserialising is construct-from-mapping, serialising is dump-to-mapping.
/// [`Validator::validate`] adds checks that the field types alone cannot
/// express.
pub trait Validator:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Checks invariants not covered by the field types.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Builds the validator from a plain mapping.
    fn from_mapping(section: &str, mapping: Mapping) -> Result<Self> {
        let value: Self =
            serde_yaml::from_value(Value::Mapping(mapping)).map_err(|e| CsvyError::Validation {
                section: section.to_string(),
                message: e.to_string(),
            })?;
        value.validate().map_err(|message| CsvyError::Validation {
            section: section.to_string(),
            message,
        })?;
        Ok(value)
    }

    /// Dumps the validator back to a plain mapping.
    fn to_mapping(&self) -> Result<Mapping> {
        match serde_yaml::to_value(self)? {
            Value::Mapping(mapping) => Ok(mapping),
            _ => Err(CsvyError::DumpNotMapping {
                section: std::any::type_name::<Self>().to_string(),
            }),
        }
    }
}

/// Object-safe view of a validator stored inside a header.
pub trait HeaderSection: fmt::Debug + Send + Sync {
    /// Flattens the section to its plain mapping.
    fn dump(&self) -> Result<Mapping>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_box(&self) -> Box<dyn HeaderSection>;

    fn eq_section(&self, other: &dyn HeaderSection) -> bool;
}

impl<T: Validator> HeaderSection for T {
    fn dump(&self) -> Result<Mapping> {
        self.to_mapping()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn HeaderSection> {
        Box::new(self.clone())
    }

    fn eq_section(&self, other: &dyn HeaderSection) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl Clone for Box<dyn HeaderSection> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn HeaderSection {
    fn eq(&self, other: &Self) -> bool {
        self.eq_section(other)
    }
}
