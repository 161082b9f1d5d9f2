//! Impact analysis for changing a field's declared type.
//!
//! Before a schema update retypes a field, the registry checks how many
//! existing entries would survive the conversion under the coercion policy.

use fieldbase_proto::Record;
use serde::Serialize;

use crate::coerce::can_convert;
use crate::schema::FieldType;

/// Maximum number of failing entries listed in a report.
pub const MAX_AFFECTED_ENTRIES: usize = 10;

/// Maximum length, in characters, of a reported current value.
pub const MAX_VALUE_PREVIEW: usize = 100;

/// An entry whose value cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedEntry {
    /// Entry identifier.
    pub entry_id: String,
    /// Current value as text, truncated.
    pub current_value: String,
}

/// Result of [`analyze_type_change`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeChangeReport {
    /// Field being retyped.
    pub field: String,
    /// Requested type.
    pub to_type: FieldType,
    /// Number of entries inspected.
    pub total_entries: usize,
    /// Entries holding a value other than null or `""`.
    pub entries_with_value: usize,
    /// Entries whose value survives the conversion.
    pub convertible: usize,
    /// Number of entries that would lose their value, including those
    /// beyond the listed ones.
    pub will_lose_data: usize,
    /// The first failing entries, in input order.
    pub affected_entries: Vec<AffectedEntry>,
}

/// Check how the entries' values for `field` fare under a change to `to_type`.
///
/// Entries without the field, or holding null or `""`, count towards
/// `total_entries` only.
pub fn analyze_type_change<'a, I>(records: I, field: &str, to_type: FieldType) -> TypeChangeReport
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut report = TypeChangeReport {
        field: field.to_string(),
        to_type,
        total_entries: 0,
        entries_with_value: 0,
        convertible: 0,
        will_lose_data: 0,
        affected_entries: Vec::new(),
    };

    for record in records {
        report.total_entries += 1;

        let value = match record.value(field) {
            Some(v) if !v.is_blank() => v,
            _ => continue,
        };
        report.entries_with_value += 1;

        if can_convert(value, to_type) {
            report.convertible += 1;
            continue;
        }
        report.will_lose_data += 1;
        if report.affected_entries.len() < MAX_AFFECTED_ENTRIES {
            report.affected_entries.push(AffectedEntry {
                entry_id: record.id.clone(),
                current_value: value.to_text().chars().take(MAX_VALUE_PREVIEW).collect(),
            });
        }
    }

    tracing::debug!(
        field,
        to_type = %to_type,
        total = report.total_entries,
        failures = report.will_lose_data,
        "analyzed type change"
    );
    report
}
