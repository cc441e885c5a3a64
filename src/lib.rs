//! # Tessera
//!
//! The indexing core of a document database.
//!
//! ## Features
//!
//! - Conversion of semi-structured documents into typed, queryable fields
//! - Numeric range fields with lexicographically sortable encodings
//! - Transactional batches with delete-before-insert re-indexing
//! - Observer hooks and per-document fault isolation
//! - Pluggable storage backends with checksummed snapshots

pub mod cli;
pub mod document;
pub mod error;
pub mod index;
pub mod indexing;
pub mod schema;
pub mod storage;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
