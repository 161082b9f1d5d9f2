//! Core error types.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A field type code outside the supported set.
    #[error("unknown field type '{0}' (expected one of BOOL, INT, DEC, STR, DATE, EMAIL, URL, DICT, LIST)")]
    UnknownFieldType(String),

    /// A field type snapshot entry could not be parsed.
    #[error("invalid field type entry '{0}' (expected name:TYPE)")]
    InvalidFieldTypeEntry(String),

    /// JSON decoding failed.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A compiled regex pattern was rejected.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
