//! Validator registry keyed by header section name.
//!
//! The [`ValidatorRegistry`] maps a header key (e.g. `csv_dialect`) to the
//! constructor of the [`Validator`] that handles it. Registries can be built
//! and used independently; a process-wide default instance backs the free
//! functions so callers do not have to thread a registry through every call.
//!
//! # Example
//!
//! ```ignore
//! use csvy_core::{register_validator, Validator};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Provenance { source: String }
//!
//! impl Validator for Provenance {}
//!
//! register_validator::<Provenance>("provenance", false)?;
//! ```

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{LazyLock, RwLock, RwLockReadGuard};

use serde_yaml::Mapping;

use crate::error::{CsvyError, Result};
use crate::validators::{CsvDialect, HeaderSection, TableSchema, Validator};

/// Section name of the CSV dialect validator.
pub const CSV_DIALECT: &str = "csv_dialect";

/// Section name of the table schema validator.
pub const SCHEMA: &str = "schema";

/// Builds a typed section from a plain mapping.
pub type SectionConstructor = fn(&str, Mapping) -> Result<Box<dyn HeaderSection>>;

fn construct<T: Validator>(section: &str, mapping: Mapping) -> Result<Box<dyn HeaderSection>> {
    Ok(Box::new(T::from_mapping(section, mapping)?))
}

/// A registered validator: its type name and constructor.
#[derive(Clone, Copy)]
pub struct RegisteredValidator {
    type_id: TypeId,
    type_name: &'static str,
    constructor: SectionConstructor,
}

impl RegisteredValidator {
    fn of<T: Validator>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            constructor: construct::<T>,
        }
    }

    /// Returns the Rust type name of the validator.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if this entry constructs values of type `T`.
    pub fn is<T: Validator>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Builds the typed section for `section` from `mapping`.
    pub fn construct(&self, section: &str, mapping: Mapping) -> Result<Box<dyn HeaderSection>> {
        (self.constructor)(section, mapping)
    }
}

impl fmt::Debug for RegisteredValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredValidator")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registry of header validators indexed by section name.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, RegisteredValidator>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `csv_dialect` and `schema` validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .validators
            .insert(CSV_DIALECT.to_string(), RegisteredValidator::of::<CsvDialect>());
        registry
            .validators
            .insert(SCHEMA.to_string(), RegisteredValidator::of::<TableSchema>());
        registry
    }

    /// Registers `T` as the validator for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CsvyError::DuplicateValidator`] if `name` is taken and
    /// `overwrite` is false. The registry is left untouched in that case.
    pub fn register<T: Validator>(&mut self, name: &str, overwrite: bool) -> Result<()> {
        if self.validators.contains_key(name) && !overwrite {
            return Err(CsvyError::DuplicateValidator {
                name: name.to_string(),
            });
        }
        tracing::debug!(
            name,
            validator = std::any::type_name::<T>(),
            overwrite,
            "registering header validator"
        );
        self.validators
            .insert(name.to_string(), RegisteredValidator::of::<T>());
        Ok(())
    }

    /// Looks up the validator registered for `name`.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredValidator> {
        self.validators.get(name)
    }

    /// Returns true if a validator is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Returns an iterator over the registered section names.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.validators.keys().map(String::as_str)
    }

    /// Returns the number of registered validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if no validators are registered.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Process-wide default registry, seeded with the built-in validators.
static DEFAULT_REGISTRY: LazyLock<RwLock<ValidatorRegistry>> =
    LazyLock::new(|| RwLock::new(ValidatorRegistry::with_builtins()));

/// Returns a read guard over the default registry.
pub fn default_registry() -> RwLockReadGuard<'static, ValidatorRegistry> {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Registers `T` under `name` in the default registry.
///
/// # Errors
///
/// Returns [`CsvyError::DuplicateValidator`] if `name` is taken and
/// `overwrite` is false.
pub fn register_validator<T: Validator>(name: &str, overwrite: bool) -> Result<()> {
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .register::<T>(name, overwrite)
}

/// Returns a copy of the default registry's current state.
pub fn snapshot_default_registry() -> ValidatorRegistry {
    default_registry().clone()
}

/// Replaces the default registry with a previously taken snapshot.
pub fn restore_default_registry(snapshot: ValidatorRegistry) {
    *DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = snapshot;
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct First {
        value: u32,
    }

    impl Validator for First {}

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Second {
        label: String,
    }

    impl Validator for Second {}

    #[test]
    fn builtins_are_registered() {
        let registry = ValidatorRegistry::with_builtins();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup(CSV_DIALECT).unwrap().is::<CsvDialect>());
        assert!(registry.lookup(SCHEMA).unwrap().is::<TableSchema>());
        assert!(registry.lookup("author").is_none());
    }

    #[test]
    fn register_new_validator() {
        let mut registry = ValidatorRegistry::new();
        registry.register::<First>("my_validator", false).unwrap();
        assert!(registry.lookup("my_validator").unwrap().is::<First>());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ValidatorRegistry::new();
        registry.register::<First>("x", false).unwrap();

        let err = registry.register::<Second>("x", false).unwrap_err();
        assert!(matches!(err, CsvyError::DuplicateValidator { ref name } if name == "x"));
        // Failed registration leaves the old entry in place
        assert!(registry.lookup("x").unwrap().is::<First>());

        registry.register::<Second>("x", true).unwrap();
        assert!(registry.lookup("x").unwrap().is::<Second>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn constructor_builds_typed_section() {
        let mut registry = ValidatorRegistry::new();
        registry.register::<First>("first", false).unwrap();

        let mut mapping = Mapping::new();
        mapping.insert("value".into(), 42.into());
        let section = registry
            .lookup("first")
            .unwrap()
            .construct("first", mapping)
            .unwrap();
        let first = section.as_any().downcast_ref::<First>().unwrap();
        assert_eq!(first.value, 42);
    }

    #[test]
    fn names_are_sorted() {
        let registry = ValidatorRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["csv_dialect", "schema"]);
    }
}
