//! Validate-only entry point for live feedback while a filter is typed.

use serde::Serialize;

use crate::ast::Node;
use crate::parser::{parse_with_config, ParserConfig};

/// Outcome of validating a filter without compiling it.
///
/// Serializes as `{"valid": true, "ast": ...}` or
/// `{"valid": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The filter parses.
    Valid { ast: Node },
    /// The filter is malformed.
    Invalid { error: String },
}

impl Validation {
    /// Check if the filter parsed.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid { .. })
    }

    /// The parsed tree, if valid.
    pub fn ast(&self) -> Option<&Node> {
        match self {
            Validation::Valid { ast } => Some(ast),
            Validation::Invalid { .. } => None,
        }
    }

    /// The error message, if invalid.
    pub fn error(&self) -> Option<&str> {
        match self {
            Validation::Valid { .. } => None,
            Validation::Invalid { error } => Some(error),
        }
    }
}

impl Serialize for Validation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Validation", 2)?;
        match self {
            Validation::Valid { ast } => {
                state.serialize_field("valid", &true)?;
                state.serialize_field("ast", ast)?;
            }
            Validation::Invalid { error } => {
                state.serialize_field("valid", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Parse a filter and report the tree or the error message.
pub fn validate(source: &str) -> Validation {
    validate_with_config(source, ParserConfig::default())
}

/// Parse a filter with explicit parser settings.
pub fn validate_with_config(source: &str, config: ParserConfig) -> Validation {
    match parse_with_config(source, config) {
        Ok(ast) => Validation::Valid { ast },
        Err(err) => {
            tracing::debug!(error = %err, "filter failed validation");
            Validation::Invalid {
                error: err.message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, Operator};
    use serde_json::json;

    #[test]
    fn test_valid() {
        let result = validate("age > 18");
        assert!(result.is_valid());
        assert_eq!(
            result.ast(),
            Some(&Node::comparison("age", Operator::Gt, Literal::Number(18.0)))
        );
        assert_eq!(result.error(), None);
    }

    #[test]
    fn test_blank_is_valid_and_empty() {
        assert_eq!(validate("  "), Validation::Valid { ast: Node::Empty });
    }

    #[test]
    fn test_invalid() {
        for source in ["status @ active", "status =", r#"(status = "x""#, "status"] {
            let result = validate(source);
            assert!(!result.is_valid(), "{}", source);
            assert!(!result.error().unwrap().is_empty());
            assert!(result.ast().is_none());
        }
    }

    #[test]
    fn test_json_shape() {
        assert_eq!(
            serde_json::to_value(validate("note is null")).unwrap(),
            json!({
                "valid": true,
                "ast": {"type": "comparison", "field": "note", "operator": "is_null", "value": null}
            })
        );
        assert_eq!(
            serde_json::to_value(validate("status")).unwrap(),
            json!({"valid": false, "error": "expected operator after field 'status'"})
        );
    }

    #[test]
    fn test_depth_setting_applies() {
        let result = validate_with_config(
            "((a = 1))",
            ParserConfig {
                max_depth: 1,
                ..ParserConfig::default()
            },
        );
        assert_eq!(result.error(), Some("expression nests deeper than 1 levels"));
    }
}
