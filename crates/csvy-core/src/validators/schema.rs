//! Table schema section (`schema`).
//!
//! A schema is a list of column descriptors in the style of Frictionless
//! Table Schema. Each descriptor is dispatched on its `type` tag to a column
//! variant whose `format` values are specific to that type. Dumps only emit
//! the fields that were present on input, under their external names, so a
//! read followed by a write reproduces the author's mapping.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Number, Value};

use super::Validator;

/// Column types of the table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Date,
    Time,
    Datetime,
    Year,
    Yearmonth,
    Duration,
    Geopoint,
    Geojson,
    Any,
}

impl ColumnType {
    /// Returns the type tag as written in the header.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Object => "object",
            ColumnType::Array => "array",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Datetime => "datetime",
            ColumnType::Year => "year",
            ColumnType::Yearmonth => "yearmonth",
            ColumnType::Duration => "duration",
            ColumnType::Geopoint => "geopoint",
            ColumnType::Geojson => "geojson",
            ColumnType::Any => "any",
        }
    }

    /// Returns true for the types handled by [`DateTimeColumn`].
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Time | ColumnType::Datetime
        )
    }

    /// Returns true for the types without a dedicated column variant.
    pub fn uses_default_column(&self) -> bool {
        matches!(
            self,
            ColumnType::Object
                | ColumnType::Array
                | ColumnType::Year
                | ColumnType::Yearmonth
                | ColumnType::Duration
                | ColumnType::Any
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_value(Value::String(s.to_string()))
            .map_err(|_| format!("unknown column type '{s}'"))
    }
}

/// Format of column types that only accept `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultFormat {
    Default,
}

/// Formats of `string` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Default,
    Email,
    Uri,
    Binary,
    Uuid,
}

/// Formats of `geopoint` columns.
///
/// - `default`: `"lat,lon"` string
/// - `array`: `[lat, lon]`
/// - `object`: `{lat: .., lon: ..}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeopointFormat {
    Default,
    Array,
    Object,
}

/// Formats of `geojson` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoJsonFormat {
    Default,
    Topojson,
}

/// Formats of `date`, `time` and `datetime` columns.
///
/// Besides `default` (ISO 8601) and `any`, a column may carry a
/// strptime-style pattern such as `%d/%m/%y`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateTimeFormat {
    Default,
    Any,
    Pattern(String),
}

impl From<String> for DateTimeFormat {
    fn from(value: String) -> Self {
        match value.as_str() {
            "default" => DateTimeFormat::Default,
            "any" => DateTimeFormat::Any,
            _ => DateTimeFormat::Pattern(value),
        }
    }
}

impl From<DateTimeFormat> for String {
    fn from(value: DateTimeFormat) -> Self {
        match value {
            DateTimeFormat::Default => "default".to_string(),
            DateTimeFormat::Any => "any".to_string(),
            DateTimeFormat::Pattern(pattern) => pattern,
        }
    }
}

/// Value constraints of a column.
///
/// Applicability depends on the column type (e.g. `pattern` for strings,
/// `minimum` for numbers and dates) but is not cross-checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl Constraints {
    /// Returns true if no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Attributes shared by every column variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnCommon {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

impl ColumnCommon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Column of `object`, `array`, `year`, `yearmonth`, `duration`, `any` or
/// unspecified type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DefaultFormat>,
}

/// Column of type `string`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
}

/// Column of type `number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DefaultFormat>,
    /// Decimal separator; `.` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_char: Option<String>,
    /// Thousands separator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_char: Option<String>,
    /// When false, values may carry non-numeric affixes such as `95%`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_number: Option<bool>,
}

/// Column of type `integer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegerColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DefaultFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_number: Option<bool>,
}

/// Column of type `boolean`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DefaultFormat>,
    /// Literals read as true; `true`, `True`, `TRUE`, `1` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_values: Option<Vec<String>>,
    /// Literals read as false; `false`, `False`, `FALSE`, `0` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_values: Option<Vec<String>>,
}

/// Column of type `date`, `time` or `datetime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DateTimeFormat>,
}

/// Column of type `geopoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeopointColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<GeopointFormat>,
}

/// Column of type `geojson`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonColumn {
    #[serde(flatten)]
    pub common: ColumnCommon,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<GeoJsonFormat>,
}

impl StringColumn {
    /// Creates a column with only its name and type set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: ColumnType::String,
            format: None,
        }
    }
}

impl NumberColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: ColumnType::Number,
            format: None,
            decimal_char: None,
            group_char: None,
            bare_number: None,
        }
    }
}

impl IntegerColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: ColumnType::Integer,
            format: None,
            bare_number: None,
        }
    }
}

impl BooleanColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: ColumnType::Boolean,
            format: None,
            true_values: None,
            false_values: None,
        }
    }
}

impl GeopointColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: ColumnType::Geopoint,
            format: None,
        }
    }
}

impl GeoJsonColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: ColumnType::Geojson,
            format: None,
        }
    }
}

impl DateTimeColumn {
    /// Creates a temporal column; `kind` must be `date`, `time` or `datetime`.
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind,
            format: None,
        }
    }
}

impl DefaultColumn {
    /// Creates a column with no type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            common: ColumnCommon::new(name),
            kind: None,
            format: None,
        }
    }
}

/// A column descriptor, discriminated by its `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    String(StringColumn),
    Number(NumberColumn),
    Integer(IntegerColumn),
    Boolean(BooleanColumn),
    DateTime(DateTimeColumn),
    Geopoint(GeopointColumn),
    GeoJson(GeoJsonColumn),
    Default(DefaultColumn),
}

impl Column {
    /// Builds a column from its descriptor, dispatching on `type`.
    ///
    /// Descriptors without a `type`, or with a type that has no dedicated
    /// variant, become [`Column::Default`].
    pub fn from_mapping(mapping: Mapping) -> Result<Self, String> {
        let kind = match mapping.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(tag)) => Some(tag.parse::<ColumnType>()?),
            Some(other) => return Err(format!("column type must be a string, found {other:?}")),
        };
        let descriptor = Value::Mapping(mapping);
        let column = match kind {
            Some(ColumnType::String) => Column::String(decode(descriptor)?),
            Some(ColumnType::Number) => Column::Number(decode(descriptor)?),
            Some(ColumnType::Integer) => Column::Integer(decode(descriptor)?),
            Some(ColumnType::Boolean) => Column::Boolean(decode(descriptor)?),
            Some(ColumnType::Date | ColumnType::Time | ColumnType::Datetime) => {
                Column::DateTime(decode(descriptor)?)
            }
            Some(ColumnType::Geopoint) => Column::Geopoint(decode(descriptor)?),
            Some(ColumnType::Geojson) => Column::GeoJson(decode(descriptor)?),
            Some(_) | None => Column::Default(decode(descriptor)?),
        };
        Ok(column)
    }

    /// Returns the attributes shared by every variant.
    pub fn common(&self) -> &ColumnCommon {
        match self {
            Column::String(c) => &c.common,
            Column::Number(c) => &c.common,
            Column::Integer(c) => &c.common,
            Column::Boolean(c) => &c.common,
            Column::DateTime(c) => &c.common,
            Column::Geopoint(c) => &c.common,
            Column::GeoJson(c) => &c.common,
            Column::Default(c) => &c.common,
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Returns the declared type, if any.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Column::String(c) => Some(c.kind),
            Column::Number(c) => Some(c.kind),
            Column::Integer(c) => Some(c.kind),
            Column::Boolean(c) => Some(c.kind),
            Column::DateTime(c) => Some(c.kind),
            Column::Geopoint(c) => Some(c.kind),
            Column::GeoJson(c) => Some(c.kind),
            Column::Default(c) => c.kind,
        }
    }

    /// Checks that the declared type belongs to the variant.
    fn check_kind(&self) -> Result<(), String> {
        let fits = match self {
            Column::String(c) => c.kind == ColumnType::String,
            Column::Number(c) => c.kind == ColumnType::Number,
            Column::Integer(c) => c.kind == ColumnType::Integer,
            Column::Boolean(c) => c.kind == ColumnType::Boolean,
            Column::DateTime(c) => c.kind.is_temporal(),
            Column::Geopoint(c) => c.kind == ColumnType::Geopoint,
            Column::GeoJson(c) => c.kind == ColumnType::Geojson,
            Column::Default(c) => c.kind.is_none_or(|kind| kind.uses_default_column()),
        };
        if fits {
            Ok(())
        } else {
            Err(format!(
                "column '{}' has type '{}' which does not match its descriptor",
                self.name(),
                self.kind().map_or("none", |kind| kind.as_str())
            ))
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(descriptor: Value) -> Result<T, String> {
    serde_yaml::from_value(descriptor).map_err(|e| e.to_string())
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mapping = Mapping::deserialize(deserializer)?;
        Column::from_mapping(mapping).map_err(D::Error::custom)
    }
}

/// Typed `schema` header section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<Column>,
    /// Literals read as missing; `[""]` when unset.
    #[serde(
        rename = "missingValues",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub missing_values: Option<Vec<String>>,
}

impl TableSchema {
    pub fn new(fields: Vec<Column>) -> Self {
        Self {
            fields,
            missing_values: None,
        }
    }

    /// Returns the column descriptor named `name`.
    pub fn field(&self, name: &str) -> Option<&Column> {
        self.fields.iter().find(|column| column.name() == name)
    }

    /// Returns the column names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(Column::name).collect()
    }

    /// Returns the missing-value literals, falling back to the empty string.
    pub fn missing_values_or_default(&self) -> Vec<String> {
        self.missing_values
            .clone()
            .unwrap_or_else(|| vec![String::new()])
    }
}

impl Validator for TableSchema {
    fn validate(&self) -> Result<(), String> {
        self.fields.iter().try_for_each(Column::check_kind)
    }
}
