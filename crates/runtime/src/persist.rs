//! Save-file persistence
//!
//! A save is one JSON document holding a [`SaveBlob`]. Writes go to a sibling `.tmp` file
//! and are renamed into place so a crash mid-write leaves the previous save intact.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use blockrise_core::SaveBlob;

#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure on a specific path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode save: {0}")]
    Encode(#[source] serde_json::Error),

    /// The file exists but is not a save document
    #[error("failed to decode save: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PersistError>;

pub fn encode(blob: &SaveBlob) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(blob).map_err(PersistError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<SaveBlob> {
    serde_json::from_slice(bytes).map_err(PersistError::Decode)
}

#[derive(Debug, Clone)]
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    pub async fn save(&self, blob: &SaveBlob) -> Result<()> {
        let bytes = encode(blob)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| io_error(&tmp, source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| io_error(&self.path, source))?;
        info!(path = %self.path.display(), bytes = bytes.len(), "save written");
        Ok(())
    }

    /// Read the save; `Ok(None)` when there is none yet
    pub async fn load(&self) -> Result<Option<SaveBlob>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => decode(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(&self.path, source)),
        }
    }

    /// Delete the save. Missing files are not an error.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "save cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(&self.path, source)),
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}
