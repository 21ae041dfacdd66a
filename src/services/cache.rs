// src/services/cache.rs
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::Result;
use crate::models::RawAuction;

/// Single on-disk snapshot of the last successfully ingested fetch.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotCache { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the snapshot, or `None` when there is none or it cannot be decoded.
    pub async fn load(&self) -> Result<Option<Vec<RawAuction>>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Vec<RawAuction>>(&bytes) {
            Ok(records) => {
                info!("Loaded {} records from cache {}", records.len(), self.path.display());
                Ok(Some(records))
            }
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Replaces the snapshot. Written beside the target and renamed into place.
    pub async fn store(&self, records: &[RawAuction]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec(records)?;
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;

        info!("Cached {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}
