//! Predicate IR handed to the document store's query executor.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::value::Value;

/// A compiled filter predicate over namespaced record keys.
///
/// The tree mirrors the filter AST: every boolean node keeps exactly the
/// operands the compiler produced, in order. Keys are fully namespaced
/// (`values.<field>`), so the executor never needs to know about the filter
/// language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every record.
    All,
    /// Key equals value. `Null` matches only the explicit sentinel.
    Eq { key: String, value: Value },
    /// Key does not equal value. Records without the key match.
    Ne { key: String, value: Value },
    /// Key greater than value.
    Gt { key: String, value: Value },
    /// Key less than value.
    Lt { key: String, value: Value },
    /// Key greater than or equal to value.
    Gte { key: String, value: Value },
    /// Key less than or equal to value.
    Lte { key: String, value: Value },
    /// Key is a string matching a regular expression.
    Regex {
        key: String,
        pattern: String,
        case_insensitive: bool,
    },
    /// Key is (or is not) structurally present in the record.
    Exists { key: String, exists: bool },
    /// All operands must match.
    And(Vec<Predicate>),
    /// At least one operand must match.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Create an equality predicate.
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a not-equal predicate.
    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Ne {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a greater-than predicate.
    pub fn gt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Gt {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a less-than predicate.
    pub fn lt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Lt {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a greater-than-or-equal predicate.
    pub fn gte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Gte {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a less-than-or-equal predicate.
    pub fn lte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Lte {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a case-insensitive regex predicate.
    pub fn regex_ci(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Regex {
            key: key.into(),
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    /// Create an existence predicate.
    pub fn exists(key: impl Into<String>, exists: bool) -> Self {
        Predicate::Exists {
            key: key.into(),
            exists,
        }
    }

    /// Create an AND predicate.
    pub fn and(operands: Vec<Predicate>) -> Self {
        Predicate::And(operands)
    }

    /// Create an OR predicate.
    pub fn or(operands: Vec<Predicate>) -> Self {
        Predicate::Or(operands)
    }

    /// Check if this is the match-everything predicate.
    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    /// Render as a MongoDB-style filter document.
    ///
    /// ```
    /// use fieldbase_proto::Predicate;
    ///
    /// let doc = Predicate::gt("values.age", 18i64).to_document();
    /// assert_eq!(doc.to_string(), r#"{"values.age":{"$gt":18}}"#);
    /// assert_eq!(Predicate::All.to_document().to_string(), "{}");
    /// ```
    pub fn to_document(&self) -> serde_json::Value {
        match self {
            Predicate::All => json!({}),
            Predicate::Eq { key, value } => single(key, value.to_json()),
            Predicate::Ne { key, value } => single(key, json!({ "$ne": value.to_json() })),
            Predicate::Gt { key, value } => single(key, json!({ "$gt": value.to_json() })),
            Predicate::Lt { key, value } => single(key, json!({ "$lt": value.to_json() })),
            Predicate::Gte { key, value } => single(key, json!({ "$gte": value.to_json() })),
            Predicate::Lte { key, value } => single(key, json!({ "$lte": value.to_json() })),
            Predicate::Regex {
                key,
                pattern,
                case_insensitive,
            } => {
                if *case_insensitive {
                    single(key, json!({ "$regex": pattern, "$options": "i" }))
                } else {
                    single(key, json!({ "$regex": pattern }))
                }
            }
            Predicate::Exists { key, exists } => single(key, json!({ "$exists": exists })),
            Predicate::And(operands) => json!({
                "$and": operands.iter().map(Predicate::to_document).collect::<Vec<_>>()
            }),
            Predicate::Or(operands) => json!({
                "$or": operands.iter().map(Predicate::to_document).collect::<Vec<_>>()
            }),
        }
    }
}

fn single(key: &str, condition: serde_json::Value) -> serde_json::Value {
    let mut doc = serde_json::Map::new();
    doc.insert(key.to_string(), condition);
    serde_json::Value::Object(doc)
}
