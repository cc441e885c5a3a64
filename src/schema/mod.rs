//! Index definitions: how each field is indexed, stored and sorted.

pub mod index_definition;

pub use index_definition::{FieldIndexing, FieldStorage, IndexDefinition, SortOptions};
