//! Output formatters for filter results.

use std::collections::BTreeSet;

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use fieldbase_core::{FieldTypes, TypeChangeReport};
use fieldbase_lang::Validation;
use fieldbase_proto::{Predicate, Record, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the entries a filter matched.
    fn format_records(&self, records: &[&Record]) -> String;

    /// Format a compiled predicate as its store document.
    fn format_predicate(&self, predicate: &Predicate) -> String;

    /// Format a validation outcome.
    fn format_validation(&self, validation: &Validation) -> String;

    /// Format a type-change impact report.
    fn format_report(&self, report: &TypeChangeReport) -> String;

    /// Format the field type snapshot.
    fn format_types(&self, types: &FieldTypes) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_records(&self, records: &[&Record]) -> String {
        if records.is_empty() {
            return "No results".to_string();
        }

        let columns = collect_columns(records);
        let mut table = Table::new();

        let mut headers: Vec<Cell> = vec![Cell::new("id")];
        for col in &columns {
            headers.push(Cell::new(col));
        }
        table.set_header(headers);

        for record in records {
            let mut cells: Vec<Cell> = vec![Cell::new(&record.id)];
            for col in &columns {
                cells.push(Cell::new(
                    record.value(col).map(format_value).unwrap_or_default(),
                ));
            }
            table.add_row(cells);
        }

        format!("{}\n{} row(s)", table, records.len())
    }

    fn format_predicate(&self, predicate: &Predicate) -> String {
        serde_json::to_string_pretty(&predicate.to_document()).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_validation(&self, validation: &Validation) -> String {
        match validation {
            Validation::Valid { ast } => {
                let fields = ast.fields();
                if fields.is_empty() {
                    "valid (matches every entry)".to_string()
                } else {
                    format!("valid (fields: {})", fields.join(", "))
                }
            }
            Validation::Invalid { error } => format!("invalid: {}", error),
        }
    }

    fn format_report(&self, report: &TypeChangeReport) -> String {
        let mut summary = Table::new();
        summary.set_header(vec!["field", "to", "entries", "with value", "convertible", "failing"]);
        summary.add_row(vec![
            report.field.clone(),
            report.to_type.to_string(),
            report.total_entries.to_string(),
            report.entries_with_value.to_string(),
            report.convertible.to_string(),
            report.will_lose_data.to_string(),
        ]);

        if report.affected_entries.is_empty() {
            return summary.to_string();
        }

        let mut affected = Table::new();
        affected.set_header(vec!["entry", "current value"]);
        for entry in &report.affected_entries {
            affected.add_row(vec![&entry.entry_id, &entry.current_value]);
        }

        format!(
            "{}\n\n{}\n{} of {} failing entries shown",
            summary,
            affected,
            report.affected_entries.len(),
            report.will_lose_data
        )
    }

    fn format_types(&self, types: &FieldTypes) -> String {
        if types.is_empty() {
            return "No field types declared (all fields are STR)".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["field", "type"]);
        for (name, field_type) in types.iter() {
            table.add_row(vec![name.to_string(), field_type.to_string()]);
        }
        table.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_records(&self, records: &[&Record]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_predicate(&self, predicate: &Predicate) -> String {
        predicate.to_document().to_string()
    }

    fn format_validation(&self, validation: &Validation) -> String {
        serde_json::to_string(validation).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_report(&self, report: &TypeChangeReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_types(&self, types: &FieldTypes) -> String {
        serde_json::to_string_pretty(types).unwrap_or_else(|_| "{}".to_string())
    }
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_records(&self, records: &[&Record]) -> String {
        let columns = collect_columns(records);
        let mut output = String::new();

        // Header: id + column names
        let mut headers: Vec<&str> = vec!["id"];
        headers.extend(columns.iter().map(String::as_str));
        output.push_str(&headers.join(","));
        output.push('\n');

        for record in records {
            let mut cells: Vec<String> = vec![format!("\"{}\"", escape_csv(&record.id))];
            for col in &columns {
                cells.push(record.value(col).map(format_value_csv).unwrap_or_default());
            }
            output.push_str(&cells.join(","));
            output.push('\n');
        }

        output
    }

    fn format_predicate(&self, predicate: &Predicate) -> String {
        format!("document\n\"{}\"", escape_csv(&predicate.to_document().to_string()))
    }

    fn format_validation(&self, validation: &Validation) -> String {
        format!(
            "valid,error\n{},\"{}\"",
            validation.is_valid(),
            escape_csv(validation.error().unwrap_or_default())
        )
    }

    fn format_report(&self, report: &TypeChangeReport) -> String {
        let mut output = String::from("entry,current_value\n");
        for entry in &report.affected_entries {
            output.push_str(&format!(
                "\"{}\",\"{}\"\n",
                escape_csv(&entry.entry_id),
                escape_csv(&entry.current_value)
            ));
        }
        output
    }

    fn format_types(&self, types: &FieldTypes) -> String {
        let mut output = String::from("field,type\n");
        for (name, field_type) in types.iter() {
            output.push_str(&format!("\"{}\",{}\n", escape_csv(name), field_type));
        }
        output
    }
}

/// Field names across all records, sorted.
fn collect_columns(records: &[&Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.values.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Format a Value as a display string.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        other => other.to_text(),
    }
}

/// Format a Value for CSV output.
fn format_value_csv(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => format!("\"{}\"", escape_csv(s)),
        Value::List(_) | Value::Dict(_) => format!("\"{}\"", escape_csv(&value.to_text())),
        _ => value.to_text(),
    }
}

/// Escape a string for CSV.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldbase_core::{analyze_type_change, FieldType};
    use fieldbase_lang::validate;

    fn records() -> Vec<Record> {
        vec![
            Record::new("e1").with_value("name", "Ada").with_value("age", 36i64),
            Record::new("e2")
                .with_value("name", "say \"hi\"")
                .with_value("note", Value::Null),
        ]
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv("hello, world"), "hello, world");
        assert_eq!(escape_csv("say \"hi\""), "say \"\"hi\"\"");
    }

    #[test]
    fn test_collect_columns() {
        let records = records();
        let refs: Vec<&Record> = records.iter().collect();
        assert_eq!(collect_columns(&refs), vec!["age", "name", "note"]);
    }

    #[test]
    fn test_table_records() {
        let records = records();
        let refs: Vec<&Record> = records.iter().collect();
        let output = TableFormatter.format_records(&refs);
        assert!(output.contains("Ada"));
        assert!(output.contains("NULL"));
        assert!(output.ends_with("2 row(s)"));
        assert_eq!(TableFormatter.format_records(&[]), "No results");
    }

    #[test]
    fn test_csv_records() {
        let records = records();
        let refs: Vec<&Record> = records.iter().collect();
        assert_eq!(
            CsvFormatter.format_records(&refs),
            "id,age,name,note\n\"e1\",36,\"Ada\",\n\"e2\",,\"say \"\"hi\"\"\",\n"
        );
    }

    #[test]
    fn test_validation_output() {
        assert_eq!(
            TableFormatter.format_validation(&validate("a = 1 AND b = 2")),
            "valid (fields: a, b)"
        );
        assert_eq!(
            TableFormatter.format_validation(&validate("")),
            "valid (matches every entry)"
        );
        assert_eq!(
            JsonFormatter.format_validation(&validate("status")),
            r#"{"valid":false,"error":"expected operator after field 'status'"}"#
        );
    }

    #[test]
    fn test_predicate_output() {
        let predicate = Predicate::eq("values.age", 18i64);
        assert_eq!(JsonFormatter.format_predicate(&predicate), r#"{"values.age":18}"#);
    }

    #[test]
    fn test_report_output() {
        let records = vec![
            Record::new("e1").with_value("age", "36"),
            Record::new("e2").with_value("age", "old"),
        ];
        let report = analyze_type_change(&records, "age", FieldType::Int);
        let output = TableFormatter.format_report(&report);
        assert!(output.contains("old"));
        assert!(output.ends_with("1 of 1 failing entries shown"));
        assert_eq!(
            CsvFormatter.format_report(&report),
            "entry,current_value\n\"e2\",\"old\"\n"
        );
    }

    #[test]
    fn test_report_counts_unlisted_failures() {
        let records: Vec<Record> = (0..12)
            .map(|i| Record::new(format!("e{}", i)).with_value("age", "old"))
            .collect();
        let report = analyze_type_change(&records, "age", FieldType::Int);
        let output = TableFormatter.format_report(&report);
        assert!(output.ends_with("10 of 12 failing entries shown"));
    }

    #[test]
    fn test_types_output() {
        let types = FieldTypes::new().with_field("age", FieldType::Int);
        assert!(TableFormatter.format_types(&types).contains("INT"));
        assert_eq!(CsvFormatter.format_types(&types), "field,type\n\"age\",INT\n");
        assert!(TableFormatter
            .format_types(&FieldTypes::new())
            .starts_with("No field types"));
    }
}
