//! Binary snapshots of committed index entries.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic    [u8; 4]  "TSNP"
//! version  u32
//! length   u64      payload length in bytes
//! crc32    u32      checksum of the payload
//! payload  [u8]     bincode-encoded entries
//! ```

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Result, TesseraError};
use crate::index::entry::IndexEntry;
use crate::storage::{Storage, StorageError};

/// Leading bytes of every snapshot.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"TSNP";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 8 + 4;

/// Encode entries into a snapshot.
pub fn encode(entries: &[IndexEntry]) -> Result<Vec<u8>> {
    let payload = bincode::serialize(entries)?;

    let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
    buffer.write_all(SNAPSHOT_MAGIC)?;
    buffer.write_u32::<LittleEndian>(SNAPSHOT_VERSION)?;
    buffer.write_u64::<LittleEndian>(payload.len() as u64)?;
    buffer.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    buffer.extend_from_slice(&payload);
    Ok(buffer)
}

/// Decode and verify a snapshot.
pub fn decode(data: &[u8]) -> Result<Vec<IndexEntry>> {
    if data.len() < HEADER_LEN {
        return Err(StorageError::Corrupted("snapshot header is truncated".to_string()).into());
    }

    let mut reader = data;
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != SNAPSHOT_MAGIC {
        return Err(StorageError::Corrupted("not a snapshot file".to_string()).into());
    }

    let version = reader.read_u32::<LittleEndian>()?;
    if version != SNAPSHOT_VERSION {
        return Err(TesseraError::storage(format!(
            "Unsupported snapshot version {version}"
        )));
    }

    let length = reader.read_u64::<LittleEndian>()?;
    let checksum = reader.read_u32::<LittleEndian>()?;
    if reader.len() as u64 != length {
        return Err(StorageError::Corrupted(format!(
            "expected {length} payload bytes, found {}",
            reader.len()
        ))
        .into());
    }
    if crc32fast::hash(reader) != checksum {
        return Err(StorageError::Corrupted("checksum mismatch".to_string()).into());
    }

    Ok(bincode::deserialize(reader)?)
}

/// Write a snapshot under `name`, replacing the previous one atomically.
pub fn save(storage: &dyn Storage, name: &str, entries: &[IndexEntry]) -> Result<()> {
    let data = encode(entries)?;
    let temp_name = format!("{name}.tmp");

    let mut output = storage.create_output(&temp_name)?;
    output.write_all(&data)?;
    output.close()?;

    storage.rename_file(&temp_name, name)?;
    storage.sync()
}

/// Load the snapshot stored under `name`, if there is one.
pub fn load(storage: &dyn Storage, name: &str) -> Result<Option<Vec<IndexEntry>>> {
    if !storage.file_exists(name) {
        return Ok(None);
    }

    let mut input = storage.open_input(name)?;
    let mut data = Vec::with_capacity(input.size()? as usize);
    input.read_to_end(&mut data)?;

    decode(&data).map(Some)
}
