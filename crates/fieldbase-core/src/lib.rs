//! Fieldbase Core - field types, coercion and reference predicate evaluation.
//!
//! This crate holds the schema-side utilities shared by the filter compiler
//! and the schema registry:
//!
//! - [`schema`] - Declared [`FieldType`]s and the [`FieldTypes`] snapshot
//! - [`coerce`] - The coercion policy behind [`try_coerce`]
//! - [`type_change`] - Impact analysis for retyping a field
//! - [`filter`] - In-memory [`PredicateEvaluator`] with document-store semantics

pub mod coerce;
pub mod error;
pub mod filter;
pub mod schema;
pub mod type_change;

pub use coerce::{can_convert, try_coerce, CoercionError, CoercionResult};
pub use error::Error;
pub use filter::{extract_predicate_keys, PredicateEvaluator};
pub use schema::{FieldType, FieldTypes};
pub use type_change::{analyze_type_change, AffectedEntry, TypeChangeReport};

/// Re-export storage-facing types.
pub use fieldbase_proto as proto;
