//! Storage abstraction layer.
//!
//! Index stores persist their state as named files through the [`Storage`]
//! trait. File and memory backends can be swapped without touching the
//! store.

pub mod file;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use file::{FileInput, FileOutput, FileStorage};
pub use memory::{MemoryInput, MemoryOutput, MemoryStorage};
pub use traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};
