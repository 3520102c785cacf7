use std::path::Path;

use crate::services::upload::UploadOutcome;

/// Uploads a single local file into a named album.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, path: &Path, album_title: &str) -> UploadOutcome;
}
