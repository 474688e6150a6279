//! Persistent image blobs, one raw file per [`CacheKey`] in a flat
//! directory. Readers never observe a partially written file.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use inlay_model::CacheKey;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{InlayError, Result};

/// Infix separating a key from the random suffix of an in-progress write.
const TEMP_MARKER: &str = ".tmp-";

/// File-backed image blobs keyed by [`CacheKey`].
///
/// Writes go to a uniquely named temp file which is synced and then renamed
/// over the final name, so a reader either sees a complete file or none at
/// all. Concurrent writers of the same key are safe: the last rename wins and
/// both carry the same bytes anyway.
#[derive(Clone, Debug)]
pub struct DiskStore {
    root: PathBuf,
}

/// Metadata returned from a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: CacheKey,
    pub byte_len: usize,
}

/// One published file in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub byte_len: u64,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|err| InlayError::cache_io(self.root.display(), err))
    }

    /// `Ok(false)` means "not cached"; an `Err` means the cache itself could
    /// not be inspected.
    pub fn has(&self, key: &CacheKey) -> Result<bool> {
        match std::fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(InlayError::cache_io(key, err)),
        }
    }

    pub fn read(&self, key: &CacheKey) -> Result<Vec<u8>> {
        std::fs::read(self.path_for(key)).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                InlayError::NotFound(key.clone())
            } else {
                InlayError::cache_io(key, err)
            }
        })
    }

    /// Delete a published entry. Removing an absent entry succeeds.
    pub fn remove(&self, key: &CacheKey) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InlayError::cache_io(key, err)),
        }
    }

    /// Atomic write (tmp + fsync + rename). Replaces any existing entry.
    pub async fn write(
        &self,
        key: &CacheKey,
        bytes: &[u8],
    ) -> Result<StoredBlob> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| InlayError::cache_io(key, err))?;

        let path = self.path_for(key);
        let tmp = self.root.join(format!(
            "{key}{TEMP_MARKER}{}",
            Uuid::new_v4().simple()
        ));

        if let Err(err) = write_synced(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(InlayError::cache_io(key, err));
        }

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(InlayError::cache_io(key, err));
        }

        debug!(
            cache.key = %key,
            bytes = bytes.len(),
            "[disk_store] published entry"
        );
        Ok(StoredBlob {
            key: key.clone(),
            byte_len: bytes.len(),
        })
    }

    /// Remove temp files abandoned by writers that crashed mid-write.
    ///
    /// Must not run while writes are in flight against this directory.
    pub fn sweep_temp_files(&self) -> Result<usize> {
        let dir = match std::fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => {
                return Err(InlayError::cache_io(self.root.display(), err));
            }
        };

        let mut removed = 0;
        for entry in dir {
            let entry = entry
                .map_err(|err| InlayError::cache_io(self.root.display(), err))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.contains(TEMP_MARKER) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(
                        path = %entry.path().display(),
                        "[disk_store] failed to sweep temp file: {err}"
                    );
                }
            }
        }
        Ok(removed)
    }

    /// Published entries, sorted by key. Temp files and foreign names are
    /// skipped.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let dir = match std::fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(InlayError::cache_io(self.root.display(), err));
            }
        };

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry
                .map_err(|err| InlayError::cache_io(self.root.display(), err))?;
            let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| CacheKey::parse(name).ok())
            else {
                continue;
            };
            let meta = entry
                .metadata()
                .map_err(|err| InlayError::cache_io(&key, err))?;
            if meta.is_file() {
                entries.push(CacheEntry {
                    key,
                    byte_len: meta.len(),
                });
            }
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
