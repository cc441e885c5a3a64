//! Command implementations for the Tessera CLI.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::document::document::Document;
use crate::document::field::FieldStore;
use crate::error::{Result, TesseraError};
use crate::index::{IndexStore, MemoryIndexStore};
use crate::indexing::{
    FieldConverter, IdentityMap, InMemoryIndexingStats, SimpleIndex, WorkContext,
};
use crate::schema::IndexDefinition;
use crate::storage::{FileStorage, Storage, StorageConfig};

/// Execute a CLI command.
pub fn execute_command(args: TesseraArgs) -> Result<()> {
    match &args.command {
        Command::Index(index_args) => index_documents(index_args, &args),
        Command::Remove(remove_args) => remove_documents(remove_args, &args),
        Command::Convert(convert_args) => convert_document(convert_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
    }
}

/// Index the documents of a JSONL file.
fn index_documents(args: &IndexArgs, cli_args: &TesseraArgs) -> Result<()> {
    let start_time = Instant::now();
    let definition = load_definition(args.definition.as_deref())?;
    let documents = read_documents(&args.document_file, &args.id_property)?;
    log::info!(
        "Indexing {} documents from {} into '{}'",
        documents.len(),
        args.document_file.display(),
        args.location.index_name
    );

    let (_, store) = open_store(&args.location)?;
    let index = SimpleIndex::new(
        args.location.index_name.clone(),
        definition,
        store.clone(),
    );
    let context = WorkContext::new();
    let mut stats = InMemoryIndexingStats::new();

    let outcome = index.index_documents(
        documents,
        &IdentityMap,
        &context,
        &mut stats,
        DateTime::<Utc>::MIN_UTC,
    )?;

    output_result(
        "Documents indexed",
        &IndexCommandResult {
            index: args.location.index_name.clone(),
            outcome,
            total_entries: store.num_docs(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            errors: context.errors(),
        },
        cli_args,
    )
}

/// Remove the entries of documents.
fn remove_documents(args: &RemoveArgs, cli_args: &TesseraArgs) -> Result<()> {
    let (_, store) = open_store(&args.location)?;
    let index = SimpleIndex::new(
        args.location.index_name.clone(),
        IndexDefinition::new(),
        store.clone(),
    );

    index.remove(&args.keys, &WorkContext::new())?;

    output_result(
        "Documents removed",
        &RemoveCommandResult {
            index: args.location.index_name.clone(),
            requested: args.keys.len(),
            total_entries: store.num_docs(),
        },
        cli_args,
    )
}

/// Show the field records of one document.
fn convert_document(args: &ConvertArgs, cli_args: &TesseraArgs) -> Result<()> {
    let definition = load_definition(args.definition.as_deref())?;
    let text = match args.document.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?,
        None => args.document.clone(),
    };
    let document = parse_object(&text)?;

    let storage = if args.store {
        FieldStore::Yes
    } else {
        FieldStore::No
    };
    let mut converter = FieldConverter::new(&definition);
    let fields = converter.index_json(&document, storage)?;

    output_result(
        "Converted fields",
        &ConvertCommandResult {
            fields: fields.iter().map(FieldRecord::from).collect(),
        },
        cli_args,
    )
}

/// Show statistics of a persisted index.
fn show_stats(args: &StatsArgs, cli_args: &TesseraArgs) -> Result<()> {
    let (storage, store) = open_store(&args.location)?;

    output_result(
        "Index statistics",
        &StatsCommandResult {
            index: args.location.index_name.clone(),
            total_entries: store.num_docs(),
            files: storage.list_files()?,
        },
        cli_args,
    )
}

fn open_store(location: &IndexLocation) -> Result<(Arc<FileStorage>, Arc<MemoryIndexStore>)> {
    let storage = Arc::new(FileStorage::new(
        &location.index_dir,
        StorageConfig::default(),
    )?);
    let store = MemoryIndexStore::open(location.index_name.clone(), storage.clone())?;
    log::info!(
        "Opened index '{}' in {} ({} entries)",
        location.index_name,
        location.index_dir.display(),
        store.num_docs()
    );
    Ok((storage, Arc::new(store)))
}

fn load_definition(path: Option<&Path>) -> Result<IndexDefinition> {
    match path {
        Some(path) => IndexDefinition::from_file(path),
        None => Ok(IndexDefinition::new()),
    }
}

fn parse_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(TesseraError::invalid_argument(format!(
            "Expected a JSON object, found {other}"
        ))),
    }
}

/// Read one document per non-empty line, taking the id from `id_property`.
pub fn read_documents(path: &Path, id_property: &str) -> Result<Vec<Document>> {
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let data = parse_object(&line).map_err(|e| {
            TesseraError::invalid_argument(format!("Line {}: {e}", line_num + 1))
        })?;
        let id = match data.get(id_property) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(TesseraError::invalid_argument(format!(
                    "Line {}: missing id property '{id_property}'",
                    line_num + 1
                )));
            }
        };

        documents.push(Document::new(id, data));
    }

    Ok(documents)
}
