use std::io::Write;
use std::path::{Path, PathBuf};

use crate::services::credentials::Credential;

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("Corrupt credential data in {path}: {source}")]
    CorruptCredentialData {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to {operation} credential file {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Durable storage for the single OAuth credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;

    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError>;
}

/// JSON token file on disk.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, operation: &'static str, source: std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Io {
            operation,
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| CredentialStoreError::CorruptCredentialData {
                path: self.path.display().to_string(),
                source,
            })
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let contents = serde_json::to_vec_pretty(credential).map_err(|e| {
            self.io_error("serialize", std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|e| self.io_error("write", std::io::Error::other(e)))?
            .map_err(|e| self.io_error("write", e))?;

        tracing::debug!(path = %self.path.display(), "Saved credential");
        Ok(())
    }
}

/// Write to a temp file beside `path`, then rename over it.
///
/// The temp file is created owner-only, and the rename keeps that mode.
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
