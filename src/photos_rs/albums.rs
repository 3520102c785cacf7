use reqwest::Client;
use url::Url;

use crate::photos_rs::endpoint_url;
use crate::photos_rs::error::{ApiError, check_status};
use crate::photos_rs::types::{
    AccessToken, AlbumsPage, CreateAlbumRequest, CreateAlbumResponse, NewAlbum,
};

/// Albums per `GET /albums` page; 50 is the API maximum.
pub const ALBUMS_PAGE_SIZE: u32 = 50;

/// Fetch one page of the user's albums.
///
/// Pass the previous page's `next_page_token` to continue; `None` starts at the beginning.
pub async fn list_albums_page(
    client: &Client,
    base_url: &Url,
    token: &AccessToken,
    page_token: Option<&str>,
) -> Result<AlbumsPage, ApiError> {
    let mut url = albums_url(base_url);
    url.query_pairs_mut()
        .append_pair("pageSize", &ALBUMS_PAGE_SIZE.to_string());
    if let Some(page_token) = page_token {
        url.query_pairs_mut().append_pair("pageToken", page_token);
    }

    let response = client
        .get(url)
        .bearer_auth(token.as_str())
        .send()
        .await
        .map_err(ApiError::Network)?;

    check_status(response)
        .await?
        .json::<AlbumsPage>()
        .await
        .map_err(ApiError::Decode)
}

/// Create an album with the given title.
pub async fn create_album(
    client: &Client,
    base_url: &Url,
    token: &AccessToken,
    title: &str,
) -> Result<CreateAlbumResponse, ApiError> {
    let response = client
        .post(albums_url(base_url))
        .bearer_auth(token.as_str())
        .json(&CreateAlbumRequest {
            album: NewAlbum { title },
        })
        .send()
        .await
        .map_err(ApiError::Network)?;

    check_status(response)
        .await?
        .json::<CreateAlbumResponse>()
        .await
        .map_err(ApiError::Decode)
}

fn albums_url(base_url: &Url) -> Url {
    endpoint_url(base_url, "albums")
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn base_url(server: &mockito::Server) -> Url {
        Url::parse(&format!("{}/v1", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_list_albums_page_sends_page_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/albums")
            .match_header("authorization", "Bearer at")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pageSize".into(), "50".into()),
                Matcher::UrlEncoded("pageToken".into(), "p2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"albums":[{"id":"A1","title":"Pets"}],"nextPageToken":"p3"}"#)
            .create_async()
            .await;

        let page = list_albums_page(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            Some("p2"),
        )
        .await
        .unwrap();

        assert_eq!(page.albums.len(), 1);
        assert_eq!(page.albums[0].id, "A1");
        assert_eq!(page.next_page_token.as_deref(), Some("p3"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_albums_empty_account() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/albums")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let page = list_albums_page(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            None,
        )
        .await
        .unwrap();

        assert!(page.albums.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_create_album_posts_title() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/albums")
            .match_body(Matcher::Json(serde_json::json!({"album": {"title": "Pets"}})))
            .with_status(200)
            .with_body(r#"{"id":"A1","title":"Pets","productUrl":"https://photos.google.com/a/A1"}"#)
            .create_async()
            .await;

        let created = create_album(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            "Pets",
        )
        .await
        .unwrap();

        assert_eq!(created.id.as_deref(), Some("A1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_album_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/albums")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = create_album(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            "Pets",
        )
        .await;

        assert!(matches!(
            result,
            Err(ApiError::Status { status: 500, .. })
        ));
    }
}
