//! Filter execution against a loaded session.

use std::path::{Path, PathBuf};

use crate::config::CliConfig;
use crate::formatter::Formatter;
use fieldbase_core::{analyze_type_change, FieldType, FieldTypes, PredicateEvaluator};
use fieldbase_lang::{parse_and_compile_with_config, validate_with_config, FilterConfig};
use fieldbase_proto::Record;
use thiserror::Error;

/// Execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Parse or compile error, rendered with source context.
    #[error("{0}")]
    Language(String),

    /// Field type, record decoding or evaluation error.
    #[error(transparent)]
    Core(#[from] fieldbase_core::Error),

    /// A file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `field:TYPE` argument.
    #[error("expected FIELD:TYPE, got '{0}'")]
    InvalidFieldSpec(String),

    /// Some filters of a script failed.
    #[error("{failed} of {total} filters failed")]
    ScriptFailed { failed: usize, total: usize },
}

/// Field types, entries and filter settings shared by every mode.
#[derive(Debug, Clone, Default)]
pub struct Session {
    field_types: FieldTypes,
    records: Option<Vec<Record>>,
    filter_config: FilterConfig,
}

impl Session {
    /// Create a session from already loaded parts.
    pub fn new(
        field_types: FieldTypes,
        records: Option<Vec<Record>>,
        filter_config: FilterConfig,
    ) -> Self {
        Self {
            field_types,
            records,
            filter_config,
        }
    }

    /// Load field types and entries named by the configuration.
    ///
    /// Inline pairs override entries of the types file.
    pub fn load(config: &CliConfig) -> Result<Self, ExecuteError> {
        let from_file = match &config.types_file {
            Some(path) => FieldTypes::from_json(&read_file(path)?)?,
            None => FieldTypes::new(),
        };
        let inline = match &config.types {
            Some(pairs) => FieldTypes::parse_pairs(pairs)?,
            None => FieldTypes::new(),
        };
        let field_types: FieldTypes = from_file.iter().chain(inline.iter()).collect();

        let records = match &config.records {
            Some(path) => Some(parse_records(&read_file(path)?)?),
            None => None,
        };

        Ok(Self::new(field_types, records, config.filter))
    }

    /// The field type snapshot.
    pub fn field_types(&self) -> &FieldTypes {
        &self.field_types
    }

    /// Declare or redeclare a field's type.
    pub fn set_field_type(&mut self, field: &str, field_type: FieldType) {
        let types = std::mem::take(&mut self.field_types);
        self.field_types = types.with_field(field, field_type);
    }

    /// Loaded entries, if any.
    pub fn records(&self) -> Option<&[Record]> {
        self.records.as_deref()
    }

    /// Number of loaded entries.
    pub fn record_count(&self) -> usize {
        self.records.as_ref().map_or(0, Vec::len)
    }

    /// Current filter settings.
    pub fn filter_config(&self) -> FilterConfig {
        self.filter_config
    }

    /// Enable or disable strict coercion.
    pub fn set_strict(&mut self, strict: bool) {
        self.filter_config = self.filter_config.with_strict(strict);
    }
}

fn read_file(path: &Path) -> Result<String, ExecuteError> {
    std::fs::read_to_string(path).map_err(|source| ExecuteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode a JSON array of entries.
pub fn parse_records(json: &str) -> Result<Vec<Record>, ExecuteError> {
    serde_json::from_str(json).map_err(|e| ExecuteError::Core(e.into()))
}

/// Run one input line: validate it, or compile and execute it.
pub fn run_line(
    session: &Session,
    input: &str,
    validate_only: bool,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    if validate_only {
        Ok(validate(session, input, formatter))
    } else {
        execute(session, input, formatter)
    }
}

/// Compile a filter and return formatted output.
///
/// With entries loaded the matching entries are printed; otherwise the
/// compiled store document is.
pub fn execute(
    session: &Session,
    input: &str,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let predicate =
        parse_and_compile_with_config(input, &session.field_types, &session.filter_config)
            .map_err(|e| ExecuteError::Language(e.format_with_source(input)))?;

    match session.records() {
        Some(records) => {
            let matched = PredicateEvaluator::filter(&predicate, records)?;
            tracing::debug!(matched = matched.len(), total = records.len(), "filter executed");
            Ok(formatter.format_records(&matched))
        }
        None => Ok(formatter.format_predicate(&predicate)),
    }
}

/// Filters of a script: one per line, skipping blank lines and `//` or `#`
/// comments.
pub fn script_filters(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
}

/// Run every filter of a script, returning each filter with its outcome.
pub fn run_script<'a>(
    session: &Session,
    content: &'a str,
    validate_only: bool,
    formatter: &dyn Formatter,
) -> Vec<(&'a str, Result<String, ExecuteError>)> {
    script_filters(content)
        .map(|filter| (filter, run_line(session, filter, validate_only, formatter)))
        .collect()
}

/// Fail when any filter of a script run failed.
pub fn script_status(results: &[(&str, Result<String, ExecuteError>)]) -> Result<(), ExecuteError> {
    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    if failed == 0 {
        return Ok(());
    }
    tracing::info!(failed, total = results.len(), "script finished with errors");
    Err(ExecuteError::ScriptFailed {
        failed,
        total: results.len(),
    })
}

/// Validate a filter without compiling it.
pub fn validate(session: &Session, input: &str, formatter: &dyn Formatter) -> String {
    formatter.format_validation(&validate_with_config(input, session.filter_config.parser))
}

/// Report the impact of a `field:TYPE` change on the loaded entries.
pub fn analyze(
    session: &Session,
    spec: &str,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let (field, to_type) = parse_field_spec(spec)?;
    let records = session.records().unwrap_or_default();
    let report = analyze_type_change(records, field, to_type);
    Ok(formatter.format_report(&report))
}

/// Split `field:TYPE` at the last colon.
pub fn parse_field_spec(spec: &str) -> Result<(&str, FieldType), ExecuteError> {
    let (field, code) = spec
        .rsplit_once(':')
        .ok_or_else(|| ExecuteError::InvalidFieldSpec(spec.to_string()))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(ExecuteError::InvalidFieldSpec(spec.to_string()));
    }
    Ok((field, code.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{JsonFormatter, TableFormatter};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn session() -> Session {
        let records = parse_records(
            r#"[
                {"id": "e1", "values": {"name": "Ada", "age": 36, "note": null}},
                {"id": "e2", "values": {"name": "Bob", "age": "17", "note": ""}},
                {"id": "e3", "values": {"name": "Cy", "age": 70}}
            ]"#,
        )
        .unwrap();
        let types = FieldTypes::new().with_field("age", FieldType::Int);
        Session::new(types, Some(records), FilterConfig::default())
    }

    #[test]
    fn test_execute_against_records() {
        let output = execute(&session(), "age > 18 AND age < 65", &JsonFormatter).unwrap();
        let rows: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["id"], "e1");
    }

    #[test]
    fn test_execute_without_records_prints_document() {
        let session = Session::new(
            FieldTypes::new().with_field("age", FieldType::Int),
            None,
            FilterConfig::default(),
        );
        assert_eq!(
            execute(&session, "age >= 18", &JsonFormatter).unwrap(),
            r#"{"values.age":{"$gte":18}}"#
        );
    }

    #[test]
    fn test_language_errors_carry_source_context() {
        let err = execute(&session(), "age >", &TableFormatter).unwrap_err();
        let ExecuteError::Language(message) = err else {
            panic!("expected language error");
        };
        assert!(message.contains("expected value"));
        assert!(message.contains("age >"));
    }

    #[test]
    fn test_strict_session() {
        let mut session = session();
        assert!(execute(&session, "age = 1.5", &TableFormatter).is_ok());
        session.set_strict(true);
        assert!(matches!(
            execute(&session, "age = 1.5", &TableFormatter),
            Err(ExecuteError::Language(_))
        ));
    }

    #[test]
    fn test_run_line_validate_only() {
        let session = session();
        assert_eq!(
            run_line(&session, "status", true, &JsonFormatter).unwrap(),
            r#"{"valid":false,"error":"expected operator after field 'status'"}"#
        );
        assert!(run_line(&session, "status", false, &JsonFormatter).is_err());
    }

    #[test]
    fn test_analyze() {
        let output = analyze(&session(), "name:INT", &JsonFormatter).unwrap();
        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["entries_with_value"], 3);
        assert_eq!(report["convertible"], 0);
        assert_eq!(report["will_lose_data"], 3);

        assert!(matches!(
            analyze(&session(), "name", &JsonFormatter),
            Err(ExecuteError::InvalidFieldSpec(_))
        ));
        assert!(matches!(
            analyze(&session(), "name:NUMBER", &JsonFormatter),
            Err(ExecuteError::Core(_))
        ));
    }

    #[test]
    fn test_script_skips_comments_and_blank_lines() {
        let script = "// adults\nage > 18\n\n# minors\n  age < 18  \n";
        assert_eq!(script_filters(script).collect::<Vec<_>>(), vec!["age > 18", "age < 18"]);
    }

    #[test]
    fn test_script_with_failures_is_an_error() {
        let session = session();
        let script = "age > 18\nage >\nname = \"Ada\"\nage ?? 1";
        let results = run_script(&session, script, false, &JsonFormatter);
        assert_eq!(results.len(), 4);
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "age >");
        assert!(results[1].1.is_err());
        assert!(results[3].1.is_err());

        let err = script_status(&results).unwrap_err();
        assert!(matches!(err, ExecuteError::ScriptFailed { failed: 2, total: 4 }));
        assert_eq!(err.to_string(), "2 of 4 filters failed");
    }

    #[test]
    fn test_clean_script_succeeds() {
        let session = session();
        let results = run_script(&session, "age > 18\nname = \"Ada\"", false, &JsonFormatter);
        assert!(script_status(&results).is_ok());
        assert!(script_status(&[]).is_ok());
    }

    #[test]
    fn test_set_field_type() {
        let mut session = session();
        session.set_field_type("name", FieldType::Bool);
        assert_eq!(session.field_types().resolve("name"), FieldType::Bool);
        assert_eq!(session.field_types().resolve("age"), FieldType::Int);
    }

    #[test]
    fn test_load_merges_types() {
        let mut types_file = NamedTempFile::new().unwrap();
        write!(types_file, r#"{{"age": "DEC", "price": "DEC"}}"#).unwrap();
        let mut records_file = NamedTempFile::new().unwrap();
        write!(records_file, r#"[{{"id": "e1", "values": {{"age": 3}}}}]"#).unwrap();

        let config = CliConfig {
            filter: FilterConfig::default(),
            format: crate::formatter::OutputFormat::Table,
            validate_only: false,
            types: Some("age:INT".to_string()),
            types_file: Some(types_file.path().to_path_buf()),
            records: Some(records_file.path().to_path_buf()),
        };
        let session = Session::load(&config).unwrap();
        assert_eq!(session.field_types().resolve("age"), FieldType::Int);
        assert_eq!(session.field_types().resolve("price"), FieldType::Dec);
        assert_eq!(session.record_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let config = CliConfig {
            filter: FilterConfig::default(),
            format: crate::formatter::OutputFormat::Table,
            validate_only: false,
            types: None,
            types_file: None,
            records: Some(PathBuf::from("/nonexistent/records.json")),
        };
        assert!(matches!(Session::load(&config), Err(ExecuteError::Io { .. })));
    }
}
