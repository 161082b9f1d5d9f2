//! Fieldbase Filter Language
//!
//! This crate provides a lexer, parser and compiler for the filter
//! expressions users type into a database search box. Expressions compile to
//! a [`Predicate`] over the `values.<field>` keys of stored entries.
//!
//! # Syntax
//!
//! ```text
//! status = "active"
//! age > 18 AND age < 65
//! name contains "john" OR email contains "john"
//! (status = "active" OR status = "pending") AND created_at > "2024-01-01"
//! price >= 100 AND price <= 500
//! description is not empty
//! note is null
//! ```
//!
//! - Comparisons: `=`, `!=`, `>`, `<`, `>=`, `<=`
//! - Text matching (case-insensitive): `contains`, `startswith`, `endswith`
//! - Checks: `is null`, `is not null`, `is empty`, `is not empty`
//! - Connectives: `AND` binds tighter than `OR`; both are case-insensitive
//! - Values: quoted strings (`"..."` or `'...'`), numbers, `true`, `false`
//!
//! # Usage
//!
//! ```rust
//! use fieldbase_core::{FieldType, FieldTypes};
//! use fieldbase_lang::{parse, compile, parse_and_compile};
//! use fieldbase_proto::Predicate;
//!
//! let types = FieldTypes::new().with_field("age", FieldType::Int);
//!
//! // Parse and compile in one step
//! let predicate = parse_and_compile("age > 18", &types).unwrap();
//! assert_eq!(predicate, Predicate::gt("values.age", 18i64));
//!
//! // Or parse and compile separately
//! let ast = parse(r#"name startswith "Jo""#).unwrap();
//! let predicate = compile(&ast, &types);
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod validate;

// Re-export main types
pub use ast::{Literal, Node, Operator};
pub use compiler::{CompileOptions, Compiler};
pub use config::FilterConfig;
pub use error::{CompileError, CompileErrorKind, LangError, ParseError};
pub use parser::{Parser, ParserConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TERMS};
pub use span::Span;
pub use validate::{validate, validate_with_config, Validation};

use fieldbase_core::FieldTypes;
use fieldbase_proto::Predicate;

/// Parse a source string into an AST.
///
/// # Example
///
/// ```rust
/// use fieldbase_lang::{parse, Node};
///
/// assert_eq!(parse("").unwrap(), Node::Empty);
/// assert!(parse("status =").is_err());
/// ```
pub fn parse(source: &str) -> Result<Node, ParseError> {
    parser::parse(source)
}

/// Compile an AST leniently against a field type snapshot.
///
/// # Example
///
/// ```rust
/// use fieldbase_core::FieldTypes;
/// use fieldbase_lang::{parse, compile};
///
/// let ast = parse("note is null").unwrap();
/// let predicate = compile(&ast, &FieldTypes::new());
/// assert_eq!(predicate.to_document().to_string(), r#"{"values.note":null}"#);
/// ```
pub fn compile(node: &Node, field_types: &FieldTypes) -> Predicate {
    compiler::compile(node, field_types)
}

/// Parse and compile a source string in one step with default settings.
pub fn parse_and_compile(source: &str, field_types: &FieldTypes) -> Result<Predicate, LangError> {
    parse_and_compile_with_config(source, field_types, &FilterConfig::default())
}

/// Parse and compile a source string in one step.
///
/// # Example
///
/// ```rust
/// use fieldbase_core::{FieldType, FieldTypes};
/// use fieldbase_lang::{parse_and_compile_with_config, FilterConfig, LangError};
///
/// let types = FieldTypes::new().with_field("age", FieldType::Int);
/// let strict = FilterConfig::default().with_strict(true);
///
/// let result = parse_and_compile_with_config("age = 18.5", &types, &strict);
/// assert!(matches!(result, Err(LangError::Compile(_))));
/// ```
pub fn parse_and_compile_with_config(
    source: &str,
    field_types: &FieldTypes,
    config: &FilterConfig,
) -> Result<Predicate, LangError> {
    let ast = parser::parse_with_config(source, config.parser)?;
    let predicate = Compiler::with_options(field_types, config.compile).compile(&ast)?;
    Ok(predicate)
}

/// Tokenize a source string (for debugging/testing).
///
/// # Example
///
/// ```rust
/// use fieldbase_lang::tokenize;
/// use fieldbase_lang::lexer::Token;
///
/// let tokens = tokenize("age > 18").unwrap();
/// assert_eq!(tokens.len(), 4);
/// assert_eq!(tokens.last().unwrap().token, Token::Eof);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<lexer::SpannedToken>, ParseError> {
    lexer::tokenize(source)
}
