use reqwest::Client;
use url::Url;

use crate::photos_rs::endpoint_url;
use crate::photos_rs::error::{ApiError, check_status};
use crate::photos_rs::types::{
    AccessToken, BatchCreateRequest, BatchCreateResponse, NewMediaItem, SimpleMediaItem,
};

/// Upload raw bytes and return the opaque upload token.
///
/// Docs: https://developers.google.com/photos/library/guides/upload-media
pub async fn upload_bytes(
    client: &Client,
    base_url: &Url,
    token: &AccessToken,
    mime_type: &str,
    bytes: Vec<u8>,
) -> Result<String, ApiError> {
    let response = client
        .post(endpoint_url(base_url, "uploads"))
        .bearer_auth(token.as_str())
        .header("Content-type", "application/octet-stream")
        .header("X-Goog-Upload-Content-Type", mime_type)
        .header("X-Goog-Upload-Protocol", "raw")
        .body(bytes)
        .send()
        .await
        .map_err(ApiError::Network)?;

    check_status(response)
        .await?
        .text()
        .await
        .map_err(ApiError::Decode)
}

/// Turn an upload token into a media item inside `album_id`.
pub async fn batch_create(
    client: &Client,
    base_url: &Url,
    token: &AccessToken,
    album_id: &str,
    upload_token: &str,
    file_name: Option<&str>,
) -> Result<BatchCreateResponse, ApiError> {
    let request = BatchCreateRequest {
        album_id,
        new_media_items: vec![NewMediaItem {
            simple_media_item: SimpleMediaItem {
                upload_token,
                file_name,
            },
        }],
    };

    let response = client
        .post(endpoint_url(base_url, "mediaItems:batchCreate"))
        .bearer_auth(token.as_str())
        .json(&request)
        .send()
        .await
        .map_err(ApiError::Network)?;

    check_status(response)
        .await?
        .json::<BatchCreateResponse>()
        .await
        .map_err(ApiError::Decode)
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::photos_rs::types::MediaItemCreation;

    fn base_url(server: &mockito::Server) -> Url {
        Url::parse(&format!("{}/v1", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_upload_bytes_sends_raw_protocol_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/uploads")
            .match_header("authorization", "Bearer at")
            .match_header("content-type", "application/octet-stream")
            .match_header("x-goog-upload-content-type", "image/jpeg")
            .match_header("x-goog-upload-protocol", "raw")
            .with_status(200)
            .with_body("upload-token")
            .create_async()
            .await;

        let upload_token = upload_bytes(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            "image/jpeg",
            vec![1, 2, 3],
        )
        .await
        .unwrap();

        assert_eq!(upload_token, "upload-token");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_bytes_maps_401() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/uploads")
            .with_status(401)
            .create_async()
            .await;

        let result = upload_bytes(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("expired"),
            "image/jpeg",
            vec![1],
        )
        .await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_upload_bytes_keeps_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/uploads")
            .with_status(400)
            .with_body("bad upload")
            .create_async()
            .await;

        let result = upload_bytes(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            "image/jpeg",
            vec![1],
        )
        .await;

        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad upload");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_create_request_and_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/mediaItems:batchCreate")
            .match_header("authorization", "Bearer at")
            .match_body(Matcher::Json(serde_json::json!({
                "albumId": "A1",
                "newMediaItems": [{
                    "simpleMediaItem": {"uploadToken": "upload-token", "fileName": "cat.jpg"}
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"newMediaItemResults":[{"uploadToken":"upload-token",
                    "status":{"message":"Success"},
                    "mediaItem":{"id":"M1","filename":"cat.jpg"}}]}"#,
            )
            .create_async()
            .await;

        let response = batch_create(
            &Client::new(),
            &base_url(&server),
            &AccessToken::new("at"),
            "A1",
            "upload-token",
            Some("cat.jpg"),
        )
        .await
        .unwrap();

        assert_eq!(
            response.outcome(),
            MediaItemCreation::Created {
                media_item_id: Some("M1".to_string())
            }
        );
        mock.assert_async().await;
    }
}
