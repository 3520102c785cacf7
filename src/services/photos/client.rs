use reqwest::Client;
use url::Url;

use crate::photos_rs::albums::{create_album, list_albums_page};
use crate::photos_rs::error::ApiError;
use crate::photos_rs::media_items::{batch_create, upload_bytes};
use crate::photos_rs::types::{AccessToken, AlbumsPage, BatchCreateResponse, CreateAlbumResponse};
use crate::ports::photos::PhotosClient;

pub struct PhotosHttpAdapter {
    client: Client,
    base_url: Url,
}

impl PhotosHttpAdapter {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl PhotosClient for PhotosHttpAdapter {
    async fn list_albums_page(
        &self,
        token: &AccessToken,
        page_token: Option<String>,
    ) -> Result<AlbumsPage, ApiError> {
        list_albums_page(&self.client, &self.base_url, token, page_token.as_deref()).await
    }

    async fn create_album(
        &self,
        token: &AccessToken,
        title: &str,
    ) -> Result<CreateAlbumResponse, ApiError> {
        create_album(&self.client, &self.base_url, token, title).await
    }

    async fn upload_bytes(
        &self,
        token: &AccessToken,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        upload_bytes(&self.client, &self.base_url, token, mime_type, bytes).await
    }

    async fn batch_create_media_item(
        &self,
        token: &AccessToken,
        album_id: &str,
        upload_token: &str,
        file_name: Option<String>,
    ) -> Result<BatchCreateResponse, ApiError> {
        batch_create(
            &self.client,
            &self.base_url,
            token,
            album_id,
            upload_token,
            file_name.as_deref(),
        )
        .await
    }
}
