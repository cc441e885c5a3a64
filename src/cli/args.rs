//! Command line argument parsing for the Tessera CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Tessera - document indexing for a document database
#[derive(Parser, Debug, Clone)]
#[command(name = "tessera")]
#[command(about = "Convert documents into index fields and maintain a persistent index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TesseraArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "json")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TesseraArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index a JSONL file of documents
    Index(IndexArgs),

    /// Remove the entries of documents by id
    Remove(RemoveArgs),

    /// Show the field records a JSON document converts to
    Convert(ConvertArgs),

    /// Show index statistics
    Stats(StatsArgs),
}

/// Location of a persisted index.
#[derive(Args, Debug, Clone)]
pub struct IndexLocation {
    /// Directory holding the index
    #[arg(long, env = "TESSERA_INDEX_DIR", value_name = "DIR")]
    pub index_dir: PathBuf,

    /// Name of the index inside the directory
    #[arg(long, default_value = "Documents")]
    pub index_name: String,
}

/// Arguments for indexing documents
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    /// Document file path (JSONL, one object per line)
    #[arg(value_name = "DOCUMENT_FILE")]
    pub document_file: PathBuf,

    /// Index definition file path (JSON)
    #[arg(short, long, value_name = "DEFINITION_FILE")]
    pub definition: Option<PathBuf>,

    /// Property holding the document id
    #[arg(long, default_value = "id")]
    pub id_property: String,
}

/// Arguments for removing documents
#[derive(Parser, Debug, Clone)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    /// Ids of the documents to remove
    #[arg(value_name = "ID", required = true)]
    pub keys: Vec<String>,
}

/// Arguments for converting a document
#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// The document as JSON text, or `@path` to read it from a file
    #[arg(value_name = "DOCUMENT")]
    pub document: String,

    /// Index definition file path (JSON)
    #[arg(short, long, value_name = "DEFINITION_FILE")]
    pub definition: Option<PathBuf>,

    /// Store converted fields unless the definition says otherwise
    #[arg(long)]
    pub store: bool,
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub location: IndexLocation,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
