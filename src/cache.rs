//! Last-applied IP cache.
//!
//! The cache is a single file holding the raw IP text, with no delimiter or
//! trailing newline. Writes go to a sibling temp file that is then renamed
//! over the cache, so a reader never sees a half-written value.

use crate::error::{DdnsError, Result};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Outcome of comparing a fetched IP with the cached one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Unchanged,
    Changed,
}

/// Exact string comparison, no normalisation of either side.
pub fn compare(new: &str, cached: &str) -> CacheStatus {
    if new == cached {
        CacheStatus::Unchanged
    } else {
        CacheStatus::Changed
    }
}

/// File-backed store for the last IP pushed to the provider.
#[derive(Debug, Clone)]
pub struct IpCache {
    path: PathBuf,
}

impl IpCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached IP. A missing file is `None`, not an error.
    pub async fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No IP cache at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(DdnsError::Cache(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Replace the cached IP.
    pub async fn store(&self, ip: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    DdnsError::Cache(format!(
                        "Failed to create cache directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let temp_path = self.temp_path()?;
        if let Err(e) = write_synced(&temp_path, ip).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(DdnsError::Cache(format!(
                "Failed to write {}: {}",
                temp_path.display(),
                e
            )));
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            DdnsError::Cache(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Cached IP {} in {}", ip, self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let mut name: OsString = self
            .path
            .file_name()
            .ok_or_else(|| {
                DdnsError::Cache(format!("{} is not a file path", self.path.display()))
            })?
            .to_os_string();
        name.push(".tmp");
        Ok(self.path.with_file_name(name))
    }
}

async fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}
