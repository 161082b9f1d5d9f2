//! CLI configuration.

use std::path::PathBuf;

use fieldbase_lang::FilterConfig;

use crate::formatter::OutputFormat;
use crate::Args;

/// Settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Parser and compiler settings.
    pub filter: FilterConfig,
    /// Output format.
    pub format: OutputFormat,
    /// Only validate filters instead of compiling them.
    pub validate_only: bool,
    /// Inline `name:TYPE` pairs.
    pub types: Option<String>,
    /// JSON file with field types.
    pub types_file: Option<PathBuf>,
    /// JSON file with entries.
    pub records: Option<PathBuf>,
}

impl From<&Args> for CliConfig {
    fn from(args: &Args) -> Self {
        Self {
            filter: FilterConfig::default()
                .with_max_depth(args.max_depth)
                .with_max_terms(args.max_terms)
                .with_strict(args.strict),
            format: args.format,
            validate_only: args.validate,
            types: args.types.clone(),
            types_file: args.types_file.clone(),
            records: args.records.clone(),
        }
    }
}
