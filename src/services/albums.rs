use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::photos_rs::error::ApiError;
use crate::photos_rs::types::AccessToken;
use crate::ports::photos::PhotosClient;

pub type AlbumId = String;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Album request was not authorized")]
    Unauthorized,
    #[error("Album \"{title}\" could not be created: response had no id")]
    AlbumCreationFailed { title: String },
    #[error("Album request for \"{title}\" failed: {source}")]
    Api {
        title: String,
        #[source]
        source: ApiError,
    },
}

impl ResolveError {
    fn from_api(title: &str, error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => ResolveError::Unauthorized,
            source => ResolveError::Api {
                title: title.to_string(),
                source,
            },
        }
    }
}

/// Maps album titles to remote album ids, creating albums that don't exist yet.
///
/// Titles match exactly (case-sensitive). Entries live for the whole run unless evicted.
pub struct AlbumResolver<C> {
    client: Arc<C>,
    cache: Mutex<HashMap<String, AlbumId>>,
}

impl<C: PhotosClient> AlbumResolver<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, token: &AccessToken, title: &str) -> Result<AlbumId, ResolveError> {
        let mut cache = self.cache.lock().await;
        if let Some(id) = cache.get(title) {
            return Ok(id.clone());
        }

        let id = match self.find_remote(token, title).await? {
            Some(id) => {
                tracing::info!(album = title, album_id = %id, "Found existing album");
                id
            }
            None => {
                let id = self.create(token, title).await?;
                tracing::info!(album = title, album_id = %id, "Created album");
                id
            }
        };

        cache.insert(title.to_string(), id.clone());
        Ok(id)
    }

    pub async fn create(&self, token: &AccessToken, title: &str) -> Result<AlbumId, ResolveError> {
        let response = self
            .client
            .create_album(token, title)
            .await
            .map_err(|e| ResolveError::from_api(title, e))?;

        match response.id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ResolveError::AlbumCreationFailed {
                title: title.to_string(),
            }),
        }
    }

    /// Forget a cached id so the next `resolve` asks the remote side again.
    pub async fn evict(&self, title: &str) -> bool {
        let evicted = self.cache.lock().await.remove(title).is_some();
        if evicted {
            tracing::info!(album = title, "Evicted cached album id");
        }
        evicted
    }

    /// Walk every page of the album list looking for an exact title match
    async fn find_remote(
        &self,
        token: &AccessToken,
        title: &str,
    ) -> Result<Option<AlbumId>, ResolveError> {
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .client
                .list_albums_page(token, page_token.take())
                .await
                .map_err(|e| ResolveError::from_api(title, e))?;

            if let Some(album) = page.albums.into_iter().find(|album| album.title == title) {
                return Ok(Some(album.id));
            }

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photos_rs::types::{Album, AlbumsPage, CreateAlbumResponse};
    use crate::ports::photos::MockPhotosClient;

    fn token() -> AccessToken {
        AccessToken::new("at")
    }

    fn page(albums: &[(&str, &str)], next: Option<&str>) -> AlbumsPage {
        AlbumsPage {
            albums: albums
                .iter()
                .map(|(id, title)| Album {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_resolve_existing_album_is_cached() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .times(1)
            .returning(|_, _| Ok(page(&[("A0", "Holiday"), ("A1", "Pets")], None)));
        client.expect_create_album().times(0);

        let resolver = AlbumResolver::new(Arc::new(client));
        assert_eq!(resolver.resolve(&token(), "Pets").await.unwrap(), "A1");
        assert_eq!(resolver.resolve(&token(), "Pets").await.unwrap(), "A1");
    }

    #[tokio::test]
    async fn test_resolve_follows_pagination() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .withf(|_, page_token| page_token.is_none())
            .times(1)
            .returning(|_, _| Ok(page(&[("A0", "Holiday")], Some("p2"))));
        client
            .expect_list_albums_page()
            .withf(|_, page_token| page_token.as_deref() == Some("p2"))
            .times(1)
            .returning(|_, _| Ok(page(&[("A7", "Pets")], None)));
        client.expect_create_album().times(0);

        let resolver = AlbumResolver::new(Arc::new(client));
        assert_eq!(resolver.resolve(&token(), "Pets").await.unwrap(), "A7");
    }

    #[tokio::test]
    async fn test_resolve_creates_missing_album_once() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .times(1)
            .returning(|_, _| Ok(page(&[("A0", "Holiday")], None)));
        client
            .expect_create_album()
            .withf(|_, title: &str| title == "Pets")
            .times(1)
            .returning(|_, _| {
                Ok(CreateAlbumResponse {
                    id: Some("A1".to_string()),
                    ..Default::default()
                })
            });

        let resolver = AlbumResolver::new(Arc::new(client));
        assert_eq!(resolver.resolve(&token(), "Pets").await.unwrap(), "A1");
        assert_eq!(resolver.resolve(&token(), "Pets").await.unwrap(), "A1");
    }

    #[tokio::test]
    async fn test_title_match_is_case_sensitive() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .returning(|_, _| Ok(page(&[("A0", "pets")], None)));
        client.expect_create_album().times(1).returning(|_, _| {
            Ok(CreateAlbumResponse {
                id: Some("A1".to_string()),
                ..Default::default()
            })
        });

        let resolver = AlbumResolver::new(Arc::new(client));
        assert_eq!(resolver.resolve(&token(), "Pets").await.unwrap(), "A1");
    }

    #[tokio::test]
    async fn test_create_without_id_fails_and_is_not_cached() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .times(2)
            .returning(|_, _| Ok(AlbumsPage::default()));
        client
            .expect_create_album()
            .times(2)
            .returning(|_, _| Ok(CreateAlbumResponse::default()));

        let resolver = AlbumResolver::new(Arc::new(client));
        for _ in 0..2 {
            let result = resolver.resolve(&token(), "Pets").await;
            assert!(matches!(
                result,
                Err(ResolveError::AlbumCreationFailed { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_unauthorized_listing_surfaces() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .times(1)
            .returning(|_, _| Err(ApiError::Unauthorized));
        client.expect_create_album().times(0);

        let resolver = AlbumResolver::new(Arc::new(client));
        let result = resolver.resolve(&token(), "Pets").await;

        assert!(matches!(result, Err(ResolveError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_evict_forces_new_lookup() {
        let mut client = MockPhotosClient::new();
        client
            .expect_list_albums_page()
            .times(2)
            .returning(|_, _| Ok(page(&[("A1", "Pets")], None)));

        let resolver = AlbumResolver::new(Arc::new(client));
        resolver.resolve(&token(), "Pets").await.unwrap();

        assert!(resolver.evict("Pets").await);
        assert!(!resolver.evict("Pets").await);
        resolver.resolve(&token(), "Pets").await.unwrap();
    }
}
