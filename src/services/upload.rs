use std::path::Path;
use std::sync::Arc;

use crate::photos_rs::error::ApiError;
use crate::photos_rs::types::MediaItemCreation;
use crate::ports::oauth::AuthorizationClient;
use crate::ports::photos::PhotosClient;
use crate::ports::uploader::MediaUploader;
use crate::services::albums::{AlbumResolver, ResolveError};
use crate::services::credentials::provider::{TokenError, TokenProvider};
use crate::services::credentials::store::CredentialStore;

/// Content type declared when the bytes match no known signature.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadFailure {
    #[error("File not found: {path}")]
    FileNotFound { path: String },
    #[error("Failed to read {path}: {reason}")]
    FileUnreadable { path: String, reason: String },
    #[error("No usable credential: {reason}")]
    CredentialUnavailable { reason: String },
    #[error("Still unauthorized after re-acquiring the access token")]
    AuthRetryExhausted,
    #[error("Upload rejected with HTTP {status}: {body}")]
    UploadRejected { status: u16, body: String },
    #[error("Album \"{title}\" could not be created: response had no id")]
    AlbumCreationFailed { title: String },
    #[error("Album lookup for \"{title}\" failed: {reason}")]
    AlbumLookupFailed { title: String, reason: String },
    #[error("Media item creation failed: {}", .message.as_deref().unwrap_or("no message from server"))]
    MediaItemCreationFailed { message: Option<String> },
    #[error("Network failure: {reason}")]
    NetworkFailure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { media_item_id: Option<String> },
    Failure(UploadFailure),
}

impl UploadOutcome {
    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

/// A single attempt either hits a 401 (retryable once) or fails for good.
enum AttemptError {
    Unauthorized,
    Failed(UploadFailure),
}

impl From<UploadFailure> for AttemptError {
    fn from(failure: UploadFailure) -> Self {
        AttemptError::Failed(failure)
    }
}

impl From<TokenError> for AttemptError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::CredentialUnavailable { reason } => {
                UploadFailure::CredentialUnavailable { reason }.into()
            }
        }
    }
}

impl From<ResolveError> for AttemptError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Unauthorized => AttemptError::Unauthorized,
            ResolveError::AlbumCreationFailed { title } => {
                UploadFailure::AlbumCreationFailed { title }.into()
            }
            ResolveError::Api {
                source: ApiError::Network(e),
                ..
            } => UploadFailure::NetworkFailure {
                reason: e.to_string(),
            }
            .into(),
            ResolveError::Api { title, source } => UploadFailure::AlbumLookupFailed {
                title,
                reason: source.to_string(),
            }
            .into(),
        }
    }
}

/// Uploads one local file into one named album.
///
/// Steps: access token, album id, raw byte upload, media item creation. A 401 from
/// any remote call invalidates the token and reruns the whole sequence exactly once.
pub struct UploadPipeline<S, A, C> {
    tokens: TokenProvider<S, A>,
    albums: AlbumResolver<C>,
    client: Arc<C>,
}

impl<S, A, C> UploadPipeline<S, A, C>
where
    S: CredentialStore,
    A: AuthorizationClient,
    C: PhotosClient,
{
    pub fn new(tokens: TokenProvider<S, A>, albums: AlbumResolver<C>, client: Arc<C>) -> Self {
        Self {
            tokens,
            albums,
            client,
        }
    }

    pub fn tokens(&self) -> &TokenProvider<S, A> {
        &self.tokens
    }

    /// Not idempotent: uploading the same file twice creates two media items.
    pub async fn upload(&self, path: &Path, album_title: &str) -> UploadOutcome {
        if !is_regular_file(path).await {
            return UploadOutcome::Failure(UploadFailure::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let result = match self.attempt(path, album_title).await {
            Err(AttemptError::Unauthorized) => {
                tracing::info!(
                    file = %path.display(),
                    album = album_title,
                    "Access token rejected, re-acquiring and retrying once"
                );
                self.tokens.invalidate().await;
                match self.attempt(path, album_title).await {
                    Err(AttemptError::Unauthorized) => {
                        self.tokens.invalidate().await;
                        Err(UploadFailure::AuthRetryExhausted)
                    }
                    Err(AttemptError::Failed(failure)) => Err(failure),
                    Ok(media_item_id) => Ok(media_item_id),
                }
            }
            Err(AttemptError::Failed(failure)) => Err(failure),
            Ok(media_item_id) => Ok(media_item_id),
        };

        match result {
            Ok(media_item_id) => UploadOutcome::Success { media_item_id },
            Err(failure) => UploadOutcome::Failure(failure),
        }
    }

    async fn attempt(
        &self,
        path: &Path,
        album_title: &str,
    ) -> Result<Option<String>, AttemptError> {
        let token = self.tokens.get_access_token().await?;
        let album_id = self.albums.resolve(&token, album_title).await?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UploadFailure::FileUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let mime_type = detect_mime_type(&bytes);
        tracing::debug!(
            file = %path.display(),
            size = bytes.len(),
            mime_type,
            "Uploading bytes"
        );

        let upload_token = self
            .client
            .upload_bytes(&token, mime_type, bytes)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => AttemptError::Unauthorized,
                ApiError::Status { status, body } => {
                    UploadFailure::UploadRejected { status, body }.into()
                }
                ApiError::Network(e) | ApiError::Decode(e) => UploadFailure::NetworkFailure {
                    reason: e.to_string(),
                }
                .into(),
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let response = match self
            .client
            .batch_create_media_item(&token, &album_id, &upload_token, file_name)
            .await
        {
            Ok(response) => response,
            Err(ApiError::Unauthorized) => return Err(AttemptError::Unauthorized),
            Err(ApiError::Network(e)) => {
                return Err(UploadFailure::NetworkFailure {
                    reason: e.to_string(),
                }
                .into());
            }
            Err(e @ (ApiError::Status { .. } | ApiError::Decode(_))) => {
                self.albums.evict(album_title).await;
                return Err(UploadFailure::MediaItemCreationFailed {
                    message: Some(e.to_string()),
                }
                .into());
            }
        };

        match response.outcome() {
            MediaItemCreation::Created { media_item_id } => Ok(media_item_id),
            MediaItemCreation::Failed { message } => {
                // The cached album may have been deleted remotely
                self.albums.evict(album_title).await;
                Err(UploadFailure::MediaItemCreationFailed { message }.into())
            }
        }
    }
}

#[async_trait::async_trait]
impl<S, A, C> MediaUploader for UploadPipeline<S, A, C>
where
    S: CredentialStore,
    A: AuthorizationClient,
    C: PhotosClient,
{
    async fn upload(&self, path: &Path, album_title: &str) -> UploadOutcome {
        UploadPipeline::upload(self, path, album_title).await
    }
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

fn detect_mime_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}
