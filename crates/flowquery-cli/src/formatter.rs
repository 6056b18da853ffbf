//! Output formatters for command results.

use crate::commands::CheckReport;
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use flowquery_core::Record;
use flowquery_proto::VariableValue;
use std::collections::BTreeSet;

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
    /// Format matched records.
    fn format_records(&self, records: &[Record]) -> String;

    /// Format a match count.
    fn format_count(&self, count: u64) -> String;

    /// Format a filter in its saved JSON form.
    fn format_filter(&self, filter: &serde_json::Value) -> String;

    /// Format the summary of a checked filter.
    fn format_check(&self, report: &CheckReport) -> String;
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
    fn format_records(&self, records: &[Record]) -> String {
        if records.is_empty() {
            return "No results".to_string();
        }
        let columns = column_names(records);

        let mut table = Table::new();
        let mut headers: Vec<Cell> = vec![Cell::new("id")];
        headers.extend(columns.iter().map(Cell::new));
        table.set_header(headers);

        for record in records {
            let mut row = vec![Cell::new(&record.id)];
            row.extend(
                columns
                    .iter()
                    .map(|c| Cell::new(record.column(c).map(format_value).unwrap_or_default())),
            );
            table.add_row(row);
        }

        format!("{}\n{} row(s)", table, records.len())
    }

    fn format_count(&self, count: u64) -> String {
        format!("{} match(es)", count)
    }

    fn format_filter(&self, filter: &serde_json::Value) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Filter", "Value"]);
        if let Some(object) = filter.as_object() {
            for (key, value) in object {
                table.add_row(vec![key.clone(), value.to_string()]);
            }
        }
        table.to_string()
    }

    fn format_check(&self, report: &CheckReport) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["entity".to_string(), report.entity.to_string()]);
        table.add_row(vec!["fields".to_string(), report.fields.join(", ")]);
        table.add_row(vec!["variables".to_string(), report.variables.to_string()]);
        table.add_row(vec!["or queries".to_string(), report.disjuncts.to_string()]);
        table.add_row(vec!["ordering".to_string(), report.ordering.to_string()]);
        table.add_row(vec![
            "matches nothing".to_string(),
            report.empty_reason.clone().unwrap_or_else(|| "no".to_string()),
        ]);
        table.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_records(&self, records: &[Record]) -> String {
        let rows: Vec<serde_json::Value> = records.iter().map(Record::to_json).collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_count(&self, count: u64) -> String {
        serde_json::json!({ "count": count }).to_string()
    }

    fn format_filter(&self, filter: &serde_json::Value) -> String {
        serde_json::to_string_pretty(filter).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_check(&self, report: &CheckReport) -> String {
        serde_json::json!({
            "entity": report.entity,
            "fields": report.fields,
            "variables": report.variables,
            "disjuncts": report.disjuncts,
            "ordering": report.ordering,
            "emptyReason": report.empty_reason,
        })
        .to_string()
    }
}

/// CSV formatter.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format_records(&self, records: &[Record]) -> String {
        let columns = column_names(records);
        let mut output = String::from("id");
        for column in &columns {
            output.push(',');
            output.push_str(&escape_csv(column));
        }
        output.push('\n');

        for record in records {
            output.push_str(&escape_csv(&record.id));
            for column in &columns {
                output.push(',');
                if let Some(value) = record.column(column) {
                    output.push_str(&escape_csv(&format_value(value)));
                }
            }
            output.push('\n');
        }
        output
    }

    fn format_count(&self, count: u64) -> String {
        format!("count\n{}", count)
    }

    fn format_filter(&self, filter: &serde_json::Value) -> String {
        let mut output = String::from("filter,value\n");
        if let Some(object) = filter.as_object() {
            for (key, value) in object {
                output.push_str(&format!("{},{}\n", escape_csv(key), escape_csv(&value.to_string())));
            }
        }
        output
    }

    fn format_check(&self, report: &CheckReport) -> String {
        format!(
            "entity,fields,variables,disjuncts,ordering,empty_reason\n{},{},{},{},{},{}",
            report.entity,
            escape_csv(&report.fields.join(" ")),
            report.variables,
            report.disjuncts,
            report.ordering,
            escape_csv(report.empty_reason.as_deref().unwrap_or_default())
        )
    }
}

/// Union of the column names of all records, sorted.
fn column_names(records: &[Record]) -> BTreeSet<String> {
    records.iter().flat_map(|r| r.columns.keys().cloned()).collect()
}

/// Render a stored value for display.
fn format_value(value: &VariableValue) -> String {
    match value {
        VariableValue::Null => "NULL".to_string(),
        VariableValue::Boolean(b) => b.to_string(),
        VariableValue::String(s) => s.clone(),
        VariableValue::Short(n) => n.to_string(),
        VariableValue::Integer(n) => n.to_string(),
        VariableValue::Long(n) => n.to_string(),
        VariableValue::Double(d) => d.to_string(),
        VariableValue::Date(ms) => chrono::DateTime::from_timestamp_millis(*ms)
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| ms.to_string()),
        VariableValue::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        VariableValue::File { name, .. } => format!("<file {}>", name),
        VariableValue::Object { serialized, .. } => serialized.clone(),
    }
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn escape_csv(s: &str) -> String {
    if s.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
