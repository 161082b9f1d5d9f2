//! Declared field types and the per-database field type snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Semantic type declared for a user-defined field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Decimal (stored as 64-bit float).
    Dec,
    /// Free text.
    #[default]
    Str,
    /// Calendar date in `YYYY-MM-DD` form.
    Date,
    /// Email address.
    Email,
    /// HTTP(S) URL.
    Url,
    /// Nested document.
    Dict,
    /// List of values.
    List,
}

impl FieldType {
    /// All supported field types, in declaration order.
    pub const ALL: [FieldType; 9] = [
        FieldType::Bool,
        FieldType::Int,
        FieldType::Dec,
        FieldType::Str,
        FieldType::Date,
        FieldType::Email,
        FieldType::Url,
        FieldType::Dict,
        FieldType::List,
    ];

    /// The upper-case code used by the schema store.
    pub fn code(&self) -> &'static str {
        match self {
            FieldType::Bool => "BOOL",
            FieldType::Int => "INT",
            FieldType::Dec => "DEC",
            FieldType::Str => "STR",
            FieldType::Date => "DATE",
            FieldType::Email => "EMAIL",
            FieldType::Url => "URL",
            FieldType::Dict => "DICT",
            FieldType::List => "LIST",
        }
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Dec)
    }

    /// Check if this type is a container.
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Dict | FieldType::List)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.code() == upper)
            .ok_or_else(|| Error::UnknownFieldType(s.to_string()))
    }
}

/// Read-only snapshot mapping field names to declared types.
///
/// Supplied by the schema registry for one database. Unknown fields resolve
/// to [`FieldType::Str`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTypes {
    types: BTreeMap<String, FieldType>,
}

impl FieldTypes {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style).
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.types.insert(name.into(), field_type);
        self
    }

    /// Declared type of a field, if known.
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.types.get(name).copied()
    }

    /// Declared type of a field, defaulting to `STR` for unknown fields.
    pub fn resolve(&self, name: &str) -> FieldType {
        self.get(name).unwrap_or_default()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over `(name, type)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.types.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parse a JSON object such as `{"age": "INT", "name": "STR"}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse comma-separated `name:TYPE` pairs, e.g. `age:INT,name:STR`.
    ///
    /// The split happens at the last `:` so field names may contain colons.
    pub fn parse_pairs(spec: &str) -> Result<Self, Error> {
        let mut types = FieldTypes::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, code) = entry
                .rsplit_once(':')
                .ok_or_else(|| Error::InvalidFieldTypeEntry(entry.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::InvalidFieldTypeEntry(entry.to_string()));
            }
            types.types.insert(name.to_string(), code.parse()?);
        }
        Ok(types)
    }
}

impl<S: Into<String>> FromIterator<(S, FieldType)> for FieldTypes {
    fn from_iter<I: IntoIterator<Item = (S, FieldType)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
