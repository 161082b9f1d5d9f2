//! In-memory predicate evaluation.
//!
//! This module provides the `PredicateEvaluator` that evaluates compiled
//! predicates against entry records with the semantics of the document
//! store that consumes them.

use std::cmp::Ordering;
use std::collections::HashSet;

use fieldbase_proto::{Predicate, Record, Value};
use regex::RegexBuilder;

use crate::error::Error;

/// Extract all storage keys referenced in a predicate.
pub fn extract_predicate_keys(predicate: &Predicate) -> HashSet<String> {
    let mut keys = HashSet::new();
    extract_predicate_keys_inner(predicate, &mut keys);
    keys
}

fn extract_predicate_keys_inner(predicate: &Predicate, keys: &mut HashSet<String>) {
    match predicate {
        Predicate::All => {}
        Predicate::Eq { key, .. }
        | Predicate::Ne { key, .. }
        | Predicate::Gt { key, .. }
        | Predicate::Lt { key, .. }
        | Predicate::Gte { key, .. }
        | Predicate::Lte { key, .. }
        | Predicate::Regex { key, .. }
        | Predicate::Exists { key, .. } => {
            keys.insert(key.clone());
        }
        Predicate::And(operands) | Predicate::Or(operands) => {
            for operand in operands {
                extract_predicate_keys_inner(operand, keys);
            }
        }
    }
}

/// Evaluates predicates against records.
pub struct PredicateEvaluator;

impl PredicateEvaluator {
    /// Evaluate a predicate against a record.
    ///
    /// Fails only when a regex pattern does not compile.
    pub fn evaluate(predicate: &Predicate, record: &Record) -> Result<bool, Error> {
        match predicate {
            Predicate::All => Ok(true),
            Predicate::Eq { key, value } => {
                Ok(Self::lookup_equals(record, key, value))
            }
            Predicate::Ne { key, value } => {
                Ok(!Self::lookup_equals(record, key, value))
            }
            Predicate::Gt { key, value } => {
                Ok(Self::compare_key(record, key, value, Ordering::is_gt))
            }
            Predicate::Lt { key, value } => {
                Ok(Self::compare_key(record, key, value, Ordering::is_lt))
            }
            Predicate::Gte { key, value } => {
                Ok(Self::compare_key(record, key, value, Ordering::is_ge))
            }
            Predicate::Lte { key, value } => {
                Ok(Self::compare_key(record, key, value, Ordering::is_le))
            }
            Predicate::Regex {
                key,
                pattern,
                case_insensitive,
            } => match record.lookup(key) {
                Some(Value::String(s)) => {
                    let re = RegexBuilder::new(pattern)
                        .case_insensitive(*case_insensitive)
                        .build()?;
                    Ok(re.is_match(&s))
                }
                _ => Ok(false),
            },
            Predicate::Exists { key, exists } => Ok(record.lookup(key).is_some() == *exists),
            Predicate::And(operands) => {
                for operand in operands {
                    if !Self::evaluate(operand, record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(operands) => {
                for operand in operands {
                    if Self::evaluate(operand, record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Keep the records matching a predicate, in input order.
    pub fn filter<'a>(predicate: &Predicate, records: &'a [Record]) -> Result<Vec<&'a Record>, Error> {
        let mut matched = Vec::new();
        for record in records {
            if Self::evaluate(predicate, record)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    /// Equality against a key; a missing key never equals anything,
    /// including `Null`.
    fn lookup_equals(record: &Record, key: &str, value: &Value) -> bool {
        match record.lookup(key) {
            Some(stored) => Self::values_equal(&stored, value),
            None => false,
        }
    }

    /// Order comparison against a key; missing keys and mismatched types
    /// never match.
    fn compare_key<F>(record: &Record, key: &str, value: &Value, accept: F) -> bool
    where
        F: FnOnce(Ordering) -> bool,
    {
        record
            .lookup(key)
            .and_then(|stored| Self::compare_values(&stored, value))
            .map(accept)
            .unwrap_or(false)
    }

    /// Check if two values are equal, comparing numbers numerically.
    fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            _ => a == b,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None, // Incompatible types
        }
    }
}
