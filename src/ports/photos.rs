use crate::photos_rs::error::ApiError;
use crate::photos_rs::types::{AccessToken, AlbumsPage, BatchCreateResponse, CreateAlbumResponse};

/// Port trait wrapping the Photos Library API calls used by the upload pipeline.
///
/// Implementations live in `services::photos::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PhotosClient: Send + Sync {
    async fn list_albums_page(
        &self,
        token: &AccessToken,
        page_token: Option<String>,
    ) -> Result<AlbumsPage, ApiError>;

    async fn create_album(
        &self,
        token: &AccessToken,
        title: &str,
    ) -> Result<CreateAlbumResponse, ApiError>;

    /// Returns the opaque upload token.
    async fn upload_bytes(
        &self,
        token: &AccessToken,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError>;

    async fn batch_create_media_item(
        &self,
        token: &AccessToken,
        album_id: &str,
        upload_token: &str,
        file_name: Option<String>,
    ) -> Result<BatchCreateResponse, ApiError>;
}
