//! Filter language configuration.

use serde::Deserialize;

use crate::compiler::CompileOptions;
use crate::parser::ParserConfig;

/// Parser and compiler settings used together by callers that both parse
/// and compile, such as the CLI.
///
/// Deserializes from partial input; missing sections take their defaults:
///
/// ```
/// use fieldbase_lang::FilterConfig;
///
/// let config: FilterConfig = serde_json::from_str(r#"{"compile": {"strict": true}}"#).unwrap();
/// assert!(config.compile.strict);
/// assert_eq!(config.parser.max_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Parser settings.
    pub parser: ParserConfig,
    /// Compiler settings.
    pub compile: CompileOptions,
}

impl FilterConfig {
    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.parser.max_depth = max_depth;
        self
    }

    /// Set the maximum number of conditions.
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.parser.max_terms = max_terms;
        self
    }

    /// Enable or disable strict coercion.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.compile.strict = strict;
        self
    }
}
