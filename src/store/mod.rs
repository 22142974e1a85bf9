// Chunk store module.
// The external key/value boundary backing interval cache entries, plus the
// codec that turns record lists into store payloads.

pub mod codec;
pub mod fs;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub use codec::{decode_chunk, encode_chunk};
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Opaque key/value store with per-entry TTL.
///
/// A missing key is a normal condition and is reported as `Ok(None)`, never
/// as an error; `Err` always means a transport or backend failure. Stores
/// must be safe for concurrent access from multiple fetch workers.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}
