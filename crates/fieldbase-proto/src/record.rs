//! Entry records as stored in the document store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Name of the sub-document that holds user-defined field values.
///
/// Compiled predicates address user fields as `values.<field>`.
pub const VALUES_KEY: &str = "values";

/// A single entry of a user-defined database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Entry identifier assigned by the store.
    pub id: String,
    /// User field values keyed by field name.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    /// Creation timestamp; defaults to the load time when absent.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create an empty record stamped with the current time.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            values: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set a field value (builder style).
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Get a user field value.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Resolve a namespaced storage key such as `values.age`.
    ///
    /// Only the `values.` namespace and the top-level `id` are addressable;
    /// a field name may itself contain dots (`values.address.city` looks up
    /// the field literally named `address.city`).
    pub fn lookup(&self, key: &str) -> Option<Value> {
        if key == "id" {
            return Some(Value::String(self.id.clone()));
        }
        let field = key.strip_prefix(VALUES_KEY)?.strip_prefix('.')?;
        self.values.get(field).cloned()
    }
}

/// Build the storage key for a user field.
pub fn field_key(field: &str) -> String {
    format!("{}.{}", VALUES_KEY, field)
}
