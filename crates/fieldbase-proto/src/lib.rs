//! Fieldbase storage-facing types.
//!
//! This crate defines the data contract between the filter language and the
//! document store that holds entries.
//!
//! # Modules
//!
//! - [`value`] - Dynamic field values, including the explicit `Null` sentinel
//! - [`record`] - Entry records and namespaced storage keys
//! - [`query`] - The compiled [`Predicate`] tree and its document rendering

pub mod query;
pub mod record;
pub mod value;

// Re-export commonly used types at crate root
pub use query::Predicate;
pub use record::{field_key, Record, VALUES_KEY};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_roundtrip() {
        let predicate = Predicate::and(vec![
            Predicate::gte(field_key("age"), 18i64),
            Predicate::or(vec![
                Predicate::eq(field_key("status"), "active"),
                Predicate::regex_ci(field_key("name"), "^jo"),
            ]),
        ]);

        let json = serde_json::to_string(&predicate).unwrap();
        let decoded: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(predicate, decoded);
    }

    #[test]
    fn test_record_roundtrip() {
        let record = Record::new("e1")
            .with_value("age", 36i64)
            .with_value("tags", vec![Value::from("a"), Value::from("b")]);

        let json = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record, decoded);
    }
}
