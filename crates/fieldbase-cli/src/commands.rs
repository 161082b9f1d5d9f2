//! REPL dot-command handling.

use crate::executor::{self, Session};
use crate::formatter::{self, OutputFormat};
use fieldbase_core::FieldType;

/// Result of executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// Exit the REPL.
    Exit,
    /// Output to display.
    Output(String),
    /// Change the output format.
    SetFormat(OutputFormat),
    /// Turn strict coercion on or off.
    SetStrict(bool),
    /// Declare a field type.
    SetFieldType(String, FieldType),
    /// Show history.
    ShowHistory,
    /// Clear screen.
    Clear,
}

/// Parse and execute a dot-command.
pub fn handle_command(line: &str, session: &Session, format: OutputFormat) -> CommandResult {
    let line = line.trim();
    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match command.as_str() {
        ".exit" | ".quit" | ".q" => CommandResult::Exit,

        ".help" | ".h" | ".?" => CommandResult::Output(get_help()),

        ".clear" | ".cls" => CommandResult::Clear,

        ".history" => CommandResult::ShowHistory,

        ".status" => {
            let config = session.filter_config();
            let records = match session.records() {
                Some(records) => format!("{} entries loaded", records.len()),
                None => "no entries loaded (filters print as documents)".to_string(),
            };
            CommandResult::Output(format!(
                "{}\n{} field type(s), strict: {}, max depth: {}, max conditions: {}",
                records,
                session.field_types().len(),
                if config.compile.strict { "on" } else { "off" },
                config.parser.max_depth,
                config.parser.max_terms
            ))
        }

        ".format" => {
            if let Some(fmt) = arg {
                match fmt.to_lowercase().as_str() {
                    "table" => CommandResult::SetFormat(OutputFormat::Table),
                    "json" => CommandResult::SetFormat(OutputFormat::Json),
                    "csv" => CommandResult::SetFormat(OutputFormat::Csv),
                    _ => CommandResult::Output(format!(
                        "Unknown format '{}'. Use: table, json, csv",
                        fmt
                    )),
                }
            } else {
                CommandResult::Output(format!("Current format: {}", format))
            }
        }

        ".strict" => match arg.map(str::to_lowercase).as_deref() {
            Some("on") | Some("true") => CommandResult::SetStrict(true),
            Some("off") | Some("false") => CommandResult::SetStrict(false),
            Some(other) => CommandResult::Output(format!("Unknown setting '{}'. Use: on, off", other)),
            None => CommandResult::Output(format!(
                "Strict mode is {}",
                if session.filter_config().compile.strict { "on" } else { "off" }
            )),
        },

        ".types" => {
            CommandResult::Output(formatter::create_formatter(format).format_types(session.field_types()))
        }

        ".type" => match arg.map(executor::parse_field_spec) {
            Some(Ok((field, field_type))) => {
                CommandResult::SetFieldType(field.to_string(), field_type)
            }
            Some(Err(e)) => CommandResult::Output(format!("Error: {}", e)),
            None => CommandResult::Output("Usage: .type <field>:<TYPE>".to_string()),
        },

        ".validate" => match arg {
            Some(filter) => CommandResult::Output(executor::validate(
                session,
                filter,
                &*formatter::create_formatter(format),
            )),
            None => CommandResult::Output("Usage: .validate <filter>".to_string()),
        },

        ".analyze" => match arg {
            Some(spec) => {
                match executor::analyze(session, spec, &*formatter::create_formatter(format)) {
                    Ok(output) => CommandResult::Output(output),
                    Err(e) => CommandResult::Output(format!("Error: {}", e)),
                }
            }
            None => CommandResult::Output("Usage: .analyze <field>:<TYPE>".to_string()),
        },

        _ => CommandResult::Output(format!("Unknown command: {}", command)),
    }
}

/// Check if a line is a dot-command.
pub fn is_command(line: &str) -> bool {
    line.trim().starts_with('.')
}

/// Get help text for REPL commands.
fn get_help() -> String {
    r#"REPL Commands
=============

.status               Show loaded entries and filter settings
.types                List declared field types
.type <field>:<TYPE>  Declare a field type (BOOL, INT, DEC, STR, DATE, EMAIL, URL, DICT, LIST)
.strict [on|off]      Get or set strict literal coercion
.validate [filter]    Check a filter's syntax; alone, toggle validate-only mode
.analyze <field>:<TYPE>  Report entries that would not survive a type change
.format [type]        Get or set output format (table, json, csv)
.history              Show filter history
.clear                Clear the screen
.help                 Show this help message
.exit / .quit         Exit the REPL

Filter Language
===============
Any other line is a filter. Comparisons: = != > < >= <=
Text (case-insensitive): contains, startswith, endswith
Checks: is null, is not null, is empty, is not empty
Combine with AND / OR and parentheses; AND binds tighter.

Examples:
  status = "active"
  age > 18 AND age < 65
  (status = "active" OR status = "pending") AND created_at > "2024-01-01"
  description is not empty
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldbase_core::FieldTypes;
    use fieldbase_lang::FilterConfig;
    use fieldbase_proto::Record;

    fn session() -> Session {
        Session::new(
            FieldTypes::new().with_field("age", FieldType::Int),
            Some(vec![Record::new("e1").with_value("age", "x")]),
            FilterConfig::default(),
        )
    }

    fn output(line: &str) -> String {
        match handle_command(line, &session(), OutputFormat::Table) {
            CommandResult::Output(text) => text,
            other => panic!("expected output, got {:?}", other),
        }
    }

    #[test]
    fn test_is_command() {
        assert!(is_command(".exit"));
        assert!(is_command(".help"));
        assert!(is_command("  .status"));
        assert!(!is_command("name = \"a.b\""));
        assert!(!is_command("age > 1"));
    }

    #[test]
    fn test_exit_and_format() {
        let session = session();
        assert!(matches!(
            handle_command(".quit", &session, OutputFormat::Table),
            CommandResult::Exit
        ));
        assert!(matches!(
            handle_command(".format JSON", &session, OutputFormat::Table),
            CommandResult::SetFormat(OutputFormat::Json)
        ));
        assert_eq!(output(".format"), "Current format: table");
        assert!(output(".format xml").starts_with("Unknown format"));
    }

    #[test]
    fn test_strict() {
        let session = session();
        assert!(matches!(
            handle_command(".strict on", &session, OutputFormat::Table),
            CommandResult::SetStrict(true)
        ));
        assert_eq!(output(".strict"), "Strict mode is off");
    }

    #[test]
    fn test_type() {
        match handle_command(".type price:dec", &session(), OutputFormat::Table) {
            CommandResult::SetFieldType(field, field_type) => {
                assert_eq!(field, "price");
                assert_eq!(field_type, FieldType::Dec);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(output(".type price").starts_with("Error:"));
        assert!(output(".type").starts_with("Usage"));
    }

    #[test]
    fn test_validate_and_analyze() {
        assert_eq!(output(".validate age > 1"), "valid (fields: age)");
        assert!(output(".validate age >").starts_with("invalid:"));
        assert!(output(".analyze age:INT").contains("1 of 1 failing entries shown"));
    }

    #[test]
    fn test_status_and_unknown() {
        assert!(output(".status").starts_with("1 entries loaded"));
        assert_eq!(output(".nope"), "Unknown command: .nope");
    }
}
