//! Reconciling caller CSV options with the header's `csv_dialect`.
//!
//! Readers take engine options from the caller and a dialect from the file.
//! The caller wins every disagreement; each disagreement is logged as a
//! warning and reported in [`MergeOutcome::conflicts`]. When anything was
//! overridden, the returned header carries an updated copy of the dialect so
//! that writing it back describes the data as it was actually read.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value;

use crate::header::Header;
use crate::registry::CSV_DIALECT;
use crate::validators::CsvDialect;

/// Caller-supplied engine options. A `Null` value counts as not set.
pub type CsvOptions = BTreeMap<String, Value>;

/// Engine-specific option names mapped to dialect attributes,
/// e.g. `separator -> delimiter`.
pub type Overrides = BTreeMap<String, String>;

/// A caller option that disagreed with the header's dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionConflict {
    /// Option name as the caller spelled it.
    pub option: String,
    /// Dialect attribute the option maps to.
    pub attribute: &'static str,
    pub caller_value: Value,
    pub dialect_value: Value,
}

impl fmt::Display for OptionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CSV option '{}' ({}) conflicts with dialect setting ({}). Using user option.",
            self.option,
            display_value(&self.caller_value),
            display_value(&self.dialect_value)
        )
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Result of [`merge_csv_options_with_dialect`].
#[derive(Debug, Clone)]
pub struct MergeOutcome<'a> {
    /// Caller options plus every dialect attribute under its engine name.
    pub options: CsvOptions,
    /// The input header, or a copy with the updated dialect if anything was
    /// overridden.
    pub header: Cow<'a, Header>,
    /// Every attribute where the caller's value won.
    pub conflicts: Vec<OptionConflict>,
}

impl MergeOutcome<'_> {
    /// Returns true if the caller overrode at least one dialect attribute.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Returns the caller value for `attribute` and the name it was given under.
fn declared<'o>(
    attribute: &str,
    options: &'o CsvOptions,
    overrides: Option<&Overrides>,
) -> Option<(&'o str, &'o Value)> {
    let found = match options.get_key_value(attribute) {
        Some(entry) => Some(entry),
        None => overrides.and_then(|overrides| {
            overrides
                .iter()
                .filter(|(_, mapped)| *mapped == attribute)
                .find_map(|(alias, _)| options.get_key_value(alias))
        }),
    };
    found
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| (name.as_str(), value))
}

/// Returns the engine name under which `attribute` is reported.
fn option_name(attribute: &'static str, overrides: Option<&Overrides>) -> String {
    overrides
        .and_then(|overrides| {
            overrides
                .iter()
                .find(|(_, mapped)| *mapped == attribute)
                .map(|(alias, _)| alias.clone())
        })
        .unwrap_or_else(|| attribute.to_string())
}

/// Merges caller options with the `csv_dialect` section of `header`.
///
/// If the header has no typed dialect, the caller options are returned as
/// they are and the header is borrowed unchanged. Otherwise every dialect
/// attribute is resolved in [`CsvDialect::ATTRIBUTES`] order: the caller
/// value (by attribute name, or by an alias from `overrides`) wins over the
/// dialect value. The merged options hold every attribute, keyed by its alias
/// when `overrides` maps one to it. Neither the header nor the options are
/// modified.
///
/// A conflict never fails the merge. If the caller's value does not fit the
/// dialect attribute (a two-character delimiter, say), the value still wins
/// in the merged options but the dialect copy keeps its own value.
pub fn merge_csv_options_with_dialect<'a>(
    header: &'a Header,
    csv_options: Option<&CsvOptions>,
    overrides: Option<&Overrides>,
) -> MergeOutcome<'a> {
    let empty = CsvOptions::new();
    let caller = csv_options.unwrap_or(&empty);
    let mut options = caller.clone();

    let Some(dialect) = header.section::<CsvDialect>(CSV_DIALECT) else {
        return MergeOutcome {
            options,
            header: Cow::Borrowed(header),
            conflicts: Vec::new(),
        };
    };

    let mut updated: Option<CsvDialect> = None;
    let mut conflicts = Vec::new();

    for attribute in CsvDialect::ATTRIBUTES {
        let Some(dialect_value) = dialect.attribute(attribute) else {
            continue;
        };
        let resolved = match declared(attribute, caller, overrides) {
            Some((name, value)) if *value != dialect_value => {
                let conflict = OptionConflict {
                    option: name.to_string(),
                    attribute,
                    caller_value: value.clone(),
                    dialect_value: dialect_value.clone(),
                };
                tracing::warn!(
                    option = %conflict.option,
                    attribute,
                    "{conflict}"
                );
                let target = updated.get_or_insert_with(|| dialect.clone());
                if let Err(error) = target.set_attribute(attribute, value.clone()) {
                    tracing::debug!(
                        attribute,
                        error = %error,
                        "caller value does not fit the dialect, header keeps the dialect value"
                    );
                }
                conflicts.push(conflict);
                value.clone()
            }
            _ => dialect_value,
        };
        options
            .entry(option_name(attribute, overrides))
            .or_insert(resolved);
    }

    let header = match updated {
        Some(dialect) => {
            let mut copy = header.clone();
            copy.insert_section(CSV_DIALECT, dialect);
            Cow::Owned(copy)
        }
        None => Cow::Borrowed(header),
    };

    MergeOutcome {
        options,
        header,
        conflicts,
    }
}
