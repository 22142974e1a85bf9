// Filesystem chunk store.
// One file per key under the platform cache directory, with an expiry header.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use directories::ProjectDirs;
use tracing::warn;

use crate::error::StoreError;

use super::ChunkStore;

/// Bytes reserved at the head of each file for the big-endian
/// unix-seconds expiry.
const EXPIRY_HEADER_LEN: usize = 8;

/// [`ChunkStore`] backed by local files.
///
/// Each entry is written atomically via a temp file and carries its expiry
/// in the first eight bytes. Expired entries read as misses and are removed.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Store under the platform cache directory (~/.cache/buildstats on
    /// Linux).
    pub fn new() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("", "", "buildstats")
            .ok_or_else(|| StoreError::Backend("no home directory for cache".to_string()))?;
        Ok(Self {
            root: dirs.cache_dir().join("chunks"),
        })
    }

    /// Store rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_name(key))
    }
}

#[async_trait]
impl ChunkStore for FsStore {
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;

        let expires_at = Utc::now().timestamp().saturating_add(ttl.as_secs() as i64);
        let path = self.path_for(key);

        // Write atomically via temp file.
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&expires_at.to_be_bytes())?;
        file.write_all(&value)?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if contents.len() < EXPIRY_HEADER_LEN {
            return Err(StoreError::Backend(format!(
                "truncated cache file for key {key}: {} bytes",
                contents.len()
            )));
        }
        let (header, payload) = contents.split_at(EXPIRY_HEADER_LEN);
        let mut raw = [0u8; EXPIRY_HEADER_LEN];
        raw.copy_from_slice(header);
        let expires_at = i64::from_be_bytes(raw);

        if Utc::now().timestamp() >= expires_at {
            if let Err(e) = fs::remove_file(&path) {
                warn!(key, error = %e, "failed to remove expired cache file");
            }
            return Ok(None);
        }

        Ok(Some(payload.to_vec()))
    }
}

/// Sanitize a key for use as a file name.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
