//! Compiler from filter AST to storage predicates.

use std::convert::Infallible;

use fieldbase_core::{try_coerce, CoercionError, FieldType, FieldTypes};
use fieldbase_proto::{field_key, Predicate, Value};
use serde::Deserialize;

use crate::ast::{Literal, Node, Operator};
use crate::error::CompileError;

/// Compiler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Reject literals that cannot be coerced to the field's declared type
    /// instead of comparing them uncoerced.
    pub strict: bool,
}

/// Compiles filter expressions against a field type snapshot.
pub struct Compiler<'a> {
    field_types: &'a FieldTypes,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    /// Create a lenient compiler.
    pub fn new(field_types: &'a FieldTypes) -> Self {
        Self::with_options(field_types, CompileOptions::default())
    }

    /// Create a compiler with explicit options.
    pub fn with_options(field_types: &'a FieldTypes, options: CompileOptions) -> Self {
        Self {
            field_types,
            options,
        }
    }

    /// Compile an expression.
    ///
    /// Only strict mode can fail, with a type mismatch.
    pub fn compile(&self, node: &Node) -> Result<Predicate, CompileError> {
        if !self.options.strict {
            return Ok(self.compile_lenient(node));
        }
        let predicate = self.lower(node, &|field: &str, literal: &Literal| {
            self.strict_operand(field, literal)
        })?;
        self.log_compiled(node);
        Ok(predicate)
    }

    fn compile_lenient(&self, node: &Node) -> Predicate {
        let predicate = self
            .lower(node, &|field: &str, literal: &Literal| {
                Ok::<_, Infallible>(self.lenient_operand(field, literal))
            })
            .unwrap_or_else(|never| match never {});
        self.log_compiled(node);
        predicate
    }

    fn log_compiled(&self, node: &Node) {
        tracing::debug!(
            strict = self.options.strict,
            fields = ?node.fields(),
            "compiled filter"
        );
    }

    fn lower<E, F>(&self, node: &Node, operand: &F) -> Result<Predicate, E>
    where
        F: Fn(&str, &Literal) -> Result<Value, E>,
    {
        match node {
            Node::Empty => Ok(Predicate::All),
            Node::And { left, right } => Ok(Predicate::and(vec![
                self.lower(left, operand)?,
                self.lower(right, operand)?,
            ])),
            Node::Or { left, right } => Ok(Predicate::or(vec![
                self.lower(left, operand)?,
                self.lower(right, operand)?,
            ])),
            Node::Comparison {
                field,
                operator,
                value,
            } => {
                // Null and emptiness checks ignore any operand.
                let value = match value {
                    Some(literal) if !operator.is_nullary() => operand(field, literal)?,
                    _ => Value::Null,
                };
                Ok(comparison(field_key(field), *operator, value))
            }
        }
    }

    /// Coerce a literal for INT, DEC and BOOL fields; other types compare
    /// the literal as written.
    fn coerce(&self, field: &str, literal: &Literal) -> Result<Value, (FieldType, CoercionError)> {
        let target = self.field_types.resolve(field);
        let raw = literal.to_value();
        if !matches!(target, FieldType::Int | FieldType::Dec | FieldType::Bool) {
            return Ok(raw);
        }
        match try_coerce(&raw, target) {
            Ok(Some(coerced)) => Ok(coerced),
            Ok(None) => Ok(raw),
            Err(err) => Err((target, err)),
        }
    }

    fn lenient_operand(&self, field: &str, literal: &Literal) -> Value {
        self.coerce(field, literal).unwrap_or_else(|(target, err)| {
            tracing::debug!(
                field,
                target = %target,
                error = %err,
                "coercion failed, comparing uncoerced literal"
            );
            literal.to_value()
        })
    }

    fn strict_operand(&self, field: &str, literal: &Literal) -> Result<Value, CompileError> {
        self.coerce(field, literal)
            .map_err(|(target, _)| CompileError::type_mismatch(field, target, &literal.to_string()))
    }
}

fn comparison(key: String, operator: Operator, value: Value) -> Predicate {
    match operator {
        Operator::Eq => Predicate::eq(key, value),
        Operator::Ne => Predicate::ne(key, value),
        Operator::Gt => Predicate::gt(key, value),
        Operator::Lt => Predicate::lt(key, value),
        Operator::Gte => Predicate::gte(key, value),
        Operator::Lte => Predicate::lte(key, value),
        Operator::Contains => Predicate::regex_ci(key, regex::escape(&value.to_text())),
        Operator::StartsWith => {
            Predicate::regex_ci(key, format!("^{}", regex::escape(&value.to_text())))
        }
        Operator::EndsWith => {
            Predicate::regex_ci(key, format!("{}$", regex::escape(&value.to_text())))
        }
        Operator::IsNull => Predicate::eq(key, Value::Null),
        Operator::IsNotNull => Predicate::ne(key, Value::Null),
        // "Empty" covers null, the empty string and a missing key.
        Operator::IsEmpty => Predicate::or(vec![
            Predicate::eq(key.clone(), Value::Null),
            Predicate::eq(key.clone(), ""),
            Predicate::exists(key, false),
        ]),
        Operator::IsNotEmpty => Predicate::and(vec![
            Predicate::ne(key.clone(), Value::Null),
            Predicate::ne(key.clone(), ""),
            Predicate::exists(key, true),
        ]),
    }
}

/// Compile an expression leniently: coercion failures fall back to the
/// literal as written.
pub fn compile(node: &Node, field_types: &FieldTypes) -> Predicate {
    Compiler::new(field_types).compile_lenient(node)
}

/// Compile an expression with explicit options.
pub fn compile_with_options(
    node: &Node,
    field_types: &FieldTypes,
    options: CompileOptions,
) -> Result<Predicate, CompileError> {
    Compiler::with_options(field_types, options).compile(node)
}
