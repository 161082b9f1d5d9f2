//! Abstract syntax tree for filter expressions.

use std::fmt;

use fieldbase_proto::Value;
use serde::{Deserialize, Serialize};

/// A parsed filter expression.
///
/// Serializes as nested JSON with a `type` discriminator:
///
/// ```
/// use fieldbase_lang::parse;
///
/// let ast = parse("age > 18").unwrap();
/// let json = serde_json::to_string(&ast).unwrap();
/// assert_eq!(
///     json,
///     r#"{"type":"comparison","field":"age","operator":"gt","value":18.0}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Blank filter; matches everything.
    Empty,
    /// Leaf predicate on one field.
    ///
    /// `value` is `None` exactly when the operator is nullary.
    Comparison {
        field: String,
        operator: Operator,
        value: Option<Literal>,
    },
    /// Both sides must hold.
    And { left: Box<Node>, right: Box<Node> },
    /// Either side must hold.
    Or { left: Box<Node>, right: Box<Node> },
}

impl Node {
    /// Build a comparison with a value.
    pub fn comparison(field: impl Into<String>, operator: Operator, value: Literal) -> Self {
        Node::Comparison {
            field: field.into(),
            operator,
            value: Some(value),
        }
    }

    /// Build a nullary check such as `is null`.
    pub fn check(field: impl Into<String>, operator: Operator) -> Self {
        Node::Comparison {
            field: field.into(),
            operator,
            value: None,
        }
    }

    /// Combine two nodes with AND.
    pub fn and(left: Node, right: Node) -> Self {
        Node::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Combine two nodes with OR.
    pub fn or(left: Node, right: Node) -> Self {
        Node::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Check if this is the empty filter.
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Field names referenced by the expression, in first-use order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        match self {
            Node::Empty => {}
            Node::Comparison { field, .. } => {
                if !fields.contains(&field.as_str()) {
                    fields.push(field);
                }
            }
            Node::And { left, right } | Node::Or { left, right } => {
                left.collect_fields(fields);
                right.collect_fields(fields);
            }
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (`=`).
    Eq,
    /// Not equal (`!=`).
    Ne,
    /// Greater than (`>`).
    Gt,
    /// Less than (`<`).
    Lt,
    /// Greater than or equal (`>=`).
    Gte,
    /// Less than or equal (`<=`).
    Lte,
    /// Case-insensitive substring match.
    Contains,
    /// Case-insensitive prefix match.
    #[serde(rename = "startswith")]
    StartsWith,
    /// Case-insensitive suffix match.
    #[serde(rename = "endswith")]
    EndsWith,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    /// Check if the operator takes no value.
    pub fn is_nullary(&self) -> bool {
        matches!(
            self,
            Operator::IsNull | Operator::IsNotNull | Operator::IsEmpty | Operator::IsNotEmpty
        )
    }

    /// Serialized operator name.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
        }
    }

    /// Surface syntax of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::StartsWith => "startswith",
            Operator::EndsWith => "endswith",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
            Operator::IsEmpty => "is empty",
            Operator::IsNotEmpty => "is not empty",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal value from the filter text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Quoted string.
    String(String),
    /// Number; the language has a single numeric type.
    Number(f64),
    /// Boolean.
    Bool(bool),
}

impl Literal {
    /// Get a description of the literal type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Number(_) => "number",
            Literal::Bool(_) => "bool",
        }
    }

    /// The uncoerced storage value.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Number(n) => Value::Float(*n),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_operator_names_match_serde() {
        let all = [
            Operator::Eq,
            Operator::Ne,
            Operator::Gt,
            Operator::Lt,
            Operator::Gte,
            Operator::Lte,
            Operator::Contains,
            Operator::StartsWith,
            Operator::EndsWith,
            Operator::IsNull,
            Operator::IsNotNull,
            Operator::IsEmpty,
            Operator::IsNotEmpty,
        ];
        for op in all {
            assert_eq!(serde_json::to_value(op).unwrap(), json!(op.name()));
        }
        assert_eq!(all.iter().filter(|op| op.is_nullary()).count(), 4);
    }

    #[test]
    fn test_node_json_shape() {
        let node = Node::or(
            Node::comparison("status", Operator::Eq, Literal::String("active".into())),
            Node::check("note", Operator::IsNotEmpty),
        );
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "type": "or",
                "left": {"type": "comparison", "field": "status", "operator": "eq", "value": "active"},
                "right": {"type": "comparison", "field": "note", "operator": "is_not_empty", "value": null}
            })
        );
        assert_eq!(serde_json::to_value(Node::Empty).unwrap(), json!({"type": "empty"}));
    }

    #[test]
    fn test_node_json_roundtrip() {
        let node = Node::and(
            Node::comparison("age", Operator::Gte, Literal::Number(18.0)),
            Node::comparison("active", Operator::Eq, Literal::Bool(true)),
        );
        let decoded: Node = serde_json::from_value(serde_json::to_value(&node).unwrap()).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_fields_in_first_use_order() {
        let node = Node::and(
            Node::comparison("b", Operator::Eq, Literal::Number(1.0)),
            Node::or(
                Node::check("a", Operator::IsNull),
                Node::comparison("b", Operator::Lt, Literal::Number(5.0)),
            ),
        );
        assert_eq!(node.fields(), vec!["b", "a"]);
        assert!(Node::Empty.fields().is_empty());
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(Literal::Number(18.0).to_value(), Value::Float(18.0));
        assert_eq!(Literal::String("x".into()).to_value(), Value::String("x".into()));
        assert_eq!(Literal::Bool(false).type_name(), "bool");
        assert_eq!(Literal::String("a\"b".into()).to_string(), r#""a\"b""#);
    }
}
