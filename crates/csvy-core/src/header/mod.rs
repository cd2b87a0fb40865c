//! The CSVY header model, its validation pipeline and its on-disk framing.

mod framing;
mod pipeline;

use std::fmt;

use serde_yaml::{Mapping, Value};

use crate::error::{CsvyError, Result, value_kind};
use crate::validators::{HeaderSection, Validator};

pub use framing::{
    DEFAULT_MARKER, HeaderBlock, ReadOptions, YamlOptions, detect_comment_prefix, read_header,
    read_header_from_reader, read_metadata, scan_header_block, write_header, write_header_to_path,
};
pub use pipeline::{validate_read, validate_read_with, validate_write};

/// A header entry: either an opaque YAML value or a typed section.
#[derive(Debug, Clone)]
pub enum HeaderValue {
    Plain(Value),
    Section(Box<dyn HeaderSection>),
}

impl HeaderValue {
    /// Wraps a typed validator.
    pub fn section<T: Validator>(section: T) -> Self {
        HeaderValue::Section(Box::new(section))
    }

    /// Returns the plain value, if this entry is not a typed section.
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            HeaderValue::Plain(value) => Some(value),
            HeaderValue::Section(_) => None,
        }
    }

    /// Downcasts a typed section to `T`.
    pub fn downcast_ref<T: Validator>(&self) -> Option<&T> {
        match self {
            HeaderValue::Section(section) => section.as_any().downcast_ref(),
            HeaderValue::Plain(_) => None,
        }
    }

    /// Mutable variant of [`HeaderValue::downcast_ref`].
    pub fn downcast_mut<T: Validator>(&mut self) -> Option<&mut T> {
        match self {
            HeaderValue::Section(section) => section.as_any_mut().downcast_mut(),
            HeaderValue::Plain(_) => None,
        }
    }

    /// Flattens the entry to a plain YAML value.
    pub fn to_value(&self) -> Result<Value> {
        match self {
            HeaderValue::Plain(value) => Ok(value.clone()),
            HeaderValue::Section(section) => section.dump().map(Value::Mapping),
        }
    }
}

impl PartialEq for HeaderValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HeaderValue::Plain(a), HeaderValue::Plain(b)) => a == b,
            (HeaderValue::Section(a), HeaderValue::Section(b)) => a.eq_section(b.as_ref()),
            _ => false,
        }
    }
}

impl From<Value> for HeaderValue {
    fn from(value: Value) -> Self {
        HeaderValue::Plain(value)
    }
}

/// An insertion-ordered header mapping.
///
/// Keys are unique; inserting an existing key replaces its value in place.
/// Two headers are equal when they hold the same keys with equal values,
/// regardless of order.
#[derive(Debug, Clone, Default)]
pub struct Header {
    entries: Vec<(String, HeaderValue)>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a header of plain values from a YAML mapping.
    ///
    /// No validation is performed; see [`validate_read`].
    pub fn from_mapping(mapping: Mapping) -> Result<Self> {
        let mut header = Self::new();
        for (key, value) in mapping {
            match key {
                Value::String(key) => header.insert(key, HeaderValue::Plain(value)),
                other => {
                    return Err(CsvyError::NonStringKey {
                        found: value_kind(&other),
                    });
                }
            };
        }
        Ok(header)
    }

    /// Builds a header from the parsed YAML document of a header block.
    ///
    /// An empty document yields an empty header.
    pub fn from_yaml_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(mapping) => Self::from_mapping(mapping),
            other => Err(CsvyError::HeaderNotMapping {
                found: value_kind(&other),
            }),
        }
    }

    /// Parses YAML text into an unvalidated header.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_yaml_value(serde_yaml::from_str(text)?)
    }

    /// Flattens every entry to its plain representation.
    pub fn to_mapping(&self) -> Result<Mapping> {
        let mut mapping = Mapping::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            mapping.insert(Value::String(key.clone()), value.to_value()?);
        }
        Ok(mapping)
    }

    /// Inserts or replaces an entry, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<HeaderValue>,
    ) -> Option<HeaderValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Inserts a typed section under `key`.
    pub fn insert_section<T: Validator>(
        &mut self,
        key: impl Into<String>,
        section: T,
    ) -> Option<HeaderValue> {
        self.insert(key, HeaderValue::section(section))
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut HeaderValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Removes an entry, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<HeaderValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the typed section stored under `key`, if it is a `T`.
    pub fn section<T: Validator>(&self, key: &str) -> Option<&T> {
        self.get(key)?.downcast_ref()
    }

    /// Mutable variant of [`Header::section`].
    pub fn section_mut<T: Validator>(&mut self, key: &str) -> Option<&mut T> {
        self.get_mut(key)?.downcast_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl IntoIterator for Header {
    type Item = (String, HeaderValue);
    type IntoIter = std::vec::IntoIter<(String, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<HeaderValue>> FromIterator<(K, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut header = Self::new();
        for (key, value) in iter {
            header.insert(key, value);
        }
        header
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mapping = self.to_mapping().map_err(|_| fmt::Error)?;
        let text = serde_yaml::to_string(&mapping).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
