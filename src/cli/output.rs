//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, TesseraArgs};
use crate::document::field::{Field, FieldIndex, FieldStore};
use crate::error::Result;
use crate::indexing::{IndexingError, IndexingOutcome};

/// Result structure for the index command.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexCommandResult {
    pub index: String,
    #[serde(flatten)]
    pub outcome: IndexingOutcome,
    pub total_entries: usize,
    pub duration_ms: u64,
    pub errors: Vec<IndexingError>,
}

/// Result structure for the remove command.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveCommandResult {
    pub index: String,
    pub requested: usize,
    pub total_entries: usize,
}

/// One converted field record.
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub value: String,
    pub numeric: bool,
    pub index: FieldIndex,
    pub store: FieldStore,
}

impl From<&Field> for FieldRecord {
    fn from(field: &Field) -> Self {
        FieldRecord {
            name: field.name().to_string(),
            value: field.string_value().into_owned(),
            numeric: field.is_numeric(),
            index: field.index(),
            store: field.store(),
        }
    }
}

/// Result structure for the convert command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConvertCommandResult {
    pub fields: Vec<FieldRecord>,
}

/// Result structure for the stats command.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsCommandResult {
    pub index: String,
    pub total_entries: usize,
    pub files: Vec<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &TesseraArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &TesseraArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(&val);
                println!("{key}: {formatted_val}");
            }
        }
        other => println!("{}", format_value(&other)),
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &TesseraArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for human output.
pub fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) if items.is_empty() => "(none)".to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| format!("\n  - {}", format_value(item)))
            .collect(),
        serde_json::Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| format!("{k}={}", format_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
