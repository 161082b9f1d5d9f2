//! Error types for parsing and compilation.

use crate::span::{offset_to_line_col, Span};
use fieldbase_core::FieldType;
use thiserror::Error;

/// Error during lexing or parsing.
///
/// Both stages stop at the first problem, so a filter produces at most one
/// of these. The message is meant to be shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Source span where the error occurred.
    pub span: Span,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Format the error with a caret under the offending source text.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!("error: {}\n", self.message);
        result.push_str(&render_location(source, self.span));
        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }
        result
    }
}

fn render_location(source: &str, span: Span) -> String {
    let (line, col) = offset_to_line_col(source, span.start);
    let mut result = format!("  --> line {}:{}\n", line, col);

    let source_line = match source.lines().nth(line - 1) {
        Some(l) => l,
        None if source.is_empty() || source.ends_with('\n') => "",
        None => return result,
    };
    result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
    result.push_str(&" ".repeat(col));
    result.push('^');

    // Underline the rest of the span that falls on this line.
    let line_chars = source_line.chars().count();
    let underline_end = span
        .end
        .min(source.len())
        .max(span.start);
    let span_chars = source
        .get(span.start..underline_end)
        .map(|s| s.chars().count())
        .unwrap_or(0);
    let remaining = line_chars.saturating_sub(col - 1);
    if span_chars > 1 {
        result.push_str(&"~".repeat(span_chars.min(remaining).saturating_sub(1)));
    }
    result.push('\n');
    result
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A literal cannot be coerced to the field's declared type.
    TypeMismatch,
}

/// Error during compilation in strict mode.
///
/// Lenient compilation never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// Field whose comparison failed.
    pub field: String,
    /// Error kind for programmatic handling.
    pub kind: CompileErrorKind,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, field: impl Into<String>, kind: CompileErrorKind) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            kind,
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(field: &str, expected: FieldType, got: &str) -> Self {
        Self::new(
            format!(
                "type mismatch on field '{}': expected {}, got {}",
                field, expected, got
            ),
            field,
            CompileErrorKind::TypeMismatch,
        )
    }
}

/// A combined error type for the public API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LangError {
    /// Parse error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// Compile error.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

impl LangError {
    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        match self {
            LangError::Parse(e) => e.format_with_source(source),
            LangError::Compile(e) => format!("error[{:?}]: {}\n", e.kind, e.message),
        }
    }

    /// The bare, user-facing message.
    pub fn message(&self) -> &str {
        match self {
            LangError::Parse(e) => &e.message,
            LangError::Compile(e) => &e.message,
        }
    }
}
