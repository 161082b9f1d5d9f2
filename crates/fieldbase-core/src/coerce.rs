//! Field type coercion policy.
//!
//! Converts a raw value into the representation a declared [`FieldType`]
//! expects. The same policy decides how filter literals are embedded in
//! compiled predicates and whether a schema type change would lose data.

use std::sync::OnceLock;

use fieldbase_proto::Value;
use regex::Regex;
use thiserror::Error;

use crate::schema::FieldType;

static DATE_PREFIX: OnceLock<Regex> = OnceLock::new();

fn date_prefix() -> &'static Regex {
    DATE_PREFIX.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid date pattern"))
}

/// A value that cannot be represented as the target type without loss.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value} to {target}")]
pub struct CoercionError {
    /// Display form of the rejected value.
    pub value: String,
    /// The requested type.
    pub target: FieldType,
}

impl CoercionError {
    fn new(value: &Value, target: FieldType) -> Self {
        Self {
            value: value.to_string(),
            target,
        }
    }
}

/// Result of a coercion: `Ok(None)` means "no value".
pub type CoercionResult = Result<Option<Value>, CoercionError>;

/// Coerce `raw` into the representation of `target`.
///
/// Null and the empty string always coerce to "no value". Numeric targets
/// never truncate: `18.5` is rejected for `INT`. Containers are accepted
/// only when the input already has that shape.
///
/// ```
/// use fieldbase_core::{try_coerce, FieldType};
/// use fieldbase_proto::Value;
///
/// assert_eq!(try_coerce(&Value::Float(18.0), FieldType::Int), Ok(Some(Value::Int(18))));
/// assert!(try_coerce(&Value::Float(18.5), FieldType::Int).is_err());
/// assert_eq!(try_coerce(&Value::from(""), FieldType::Date), Ok(None));
/// ```
pub fn try_coerce(raw: &Value, target: FieldType) -> CoercionResult {
    if raw.is_blank() {
        return Ok(None);
    }

    let fail = || CoercionError::new(raw, target);

    match target {
        FieldType::Str => Ok(Some(Value::String(raw.to_text()))),
        FieldType::Int => to_int(raw).map(|v| v.map(Value::Int)).ok_or_else(fail),
        FieldType::Dec => to_dec(raw).map(|v| v.map(Value::Float)).ok_or_else(fail),
        FieldType::Bool => to_bool(raw).map(|b| Some(Value::Bool(b))).ok_or_else(fail),
        FieldType::Date => text_check(raw, |s| date_prefix().is_match(s)).ok_or_else(fail),
        FieldType::Email => text_check(raw, |s| s.contains('@') && s.contains('.')).ok_or_else(fail),
        FieldType::Url => {
            text_check(raw, |s| s.starts_with("http://") || s.starts_with("https://"))
                .ok_or_else(fail)
        }
        FieldType::Dict => match raw {
            Value::Dict(_) => Ok(Some(raw.clone())),
            _ => Err(fail()),
        },
        FieldType::List => match raw {
            Value::List(_) => Ok(Some(raw.clone())),
            _ => Err(fail()),
        },
    }
}

/// Check whether `raw` survives a change to `target`.
pub fn can_convert(raw: &Value, target: FieldType) -> bool {
    try_coerce(raw, target).is_ok()
}

/// `None` on failure, `Some(None)` for a blank string.
fn to_int(raw: &Value) -> Option<Option<i64>> {
    match raw {
        Value::Bool(b) => Some(Some(i64::from(*b))),
        Value::Int(i) => Some(Some(*i)),
        Value::Float(f) => integral(*f).map(Some),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(None);
            }
            let parsed: f64 = trimmed.parse().ok()?;
            integral(parsed).map(Some)
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if !f.is_finite() || f.fract() != 0.0 || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}

fn to_dec(raw: &Value) -> Option<Option<f64>> {
    match raw {
        Value::Bool(b) => Some(Some(if *b { 1.0 } else { 0.0 })),
        Value::Int(i) => Some(Some(*i as f64)),
        Value::Float(f) => Some(Some(*f)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(None);
            }
            trimmed.parse().ok().map(Some)
        }
        _ => None,
    }
}

fn to_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        other => match other.to_text().trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
    }
}

/// Validate the trimmed text form of `raw`; blank text is "no value".
fn text_check(raw: &Value, accept: impl Fn(&str) -> bool) -> Option<Option<Value>> {
    let text = raw.to_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    if accept(trimmed) {
        Some(Some(Value::String(trimmed.to_string())))
    } else {
        None
    }
}
