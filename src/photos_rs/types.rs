use serde::{Deserialize, Serialize};

/// Status code the Photos API uses for a successful item (google.rpc.Code.OK).
pub const STATUS_CODE_OK: i32 = 0;

/// Bearer token sent on every Photos API request.
///
/// `Debug` is redacted so the token never ends up in log output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// OAuth token endpoint response, for both code and refresh exchanges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Album as returned by `GET /albums`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// One page of `GET /albums`.
///
/// The API omits `albums` entirely when the account has none.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsPage {
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAlbumRequest<'a> {
    pub album: NewAlbum<'a>,
}

#[derive(Debug, Serialize)]
pub struct NewAlbum<'a> {
    pub title: &'a str,
}

/// Response of `POST /albums`; `id` is checked by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbumResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateRequest<'a> {
    pub album_id: &'a str,
    pub new_media_items: Vec<NewMediaItem<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItem<'a> {
    pub simple_media_item: SimpleMediaItem<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleMediaItem<'a> {
    pub upload_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub new_media_item_results: Vec<NewMediaItemResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItemResult {
    #[serde(default)]
    pub upload_token: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub media_item: Option<MediaItem>,
}

/// google.rpc.Status. proto3 JSON drops a zero `code`, so `None` means OK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Classification of a single-item `batchCreate` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaItemCreation {
    Created { media_item_id: Option<String> },
    Failed { message: Option<String> },
}

impl BatchCreateResponse {
    /// Inspect the first result; the pipeline only ever submits one item.
    pub fn outcome(&self) -> MediaItemCreation {
        let Some(result) = self.new_media_item_results.first() else {
            return MediaItemCreation::Failed {
                message: Some("Response contained no media item results".to_string()),
            };
        };

        match &result.status {
            Some(Status { code, .. }) if code.unwrap_or(STATUS_CODE_OK) == STATUS_CODE_OK => {
                MediaItemCreation::Created {
                    media_item_id: result.media_item.as_ref().map(|item| item.id.clone()),
                }
            }
            Some(Status { message, .. }) => MediaItemCreation::Failed {
                message: message.clone(),
            },
            None => MediaItemCreation::Failed {
                message: Some("Media item result had no status".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("ya29.secret");
        assert_eq!(format!("{:?}", token), "AccessToken(..)");
        assert_eq!(token.as_str(), "ya29.secret");
    }

    #[test]
    fn test_albums_page_without_albums_field() {
        let page: AlbumsPage = serde_json::from_str("{}").unwrap();
        assert!(page.albums.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_albums_page_with_next_token() {
        let page: AlbumsPage = serde_json::from_str(
            r#"{"albums":[{"id":"A1","title":"Pets"}],"nextPageToken":"p2"}"#,
        )
        .unwrap();
        assert_eq!(page.albums[0].title, "Pets");
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
    }

    #[test]
    fn test_batch_create_request_shape() {
        let request = BatchCreateRequest {
            album_id: "A1",
            new_media_items: vec![NewMediaItem {
                simple_media_item: SimpleMediaItem {
                    upload_token: "tok",
                    file_name: Some("cat.jpg"),
                },
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["albumId"], "A1");
        assert_eq!(
            json["newMediaItems"][0]["simpleMediaItem"]["uploadToken"],
            "tok"
        );
        assert_eq!(
            json["newMediaItems"][0]["simpleMediaItem"]["fileName"],
            "cat.jpg"
        );
    }

    #[test]
    fn test_outcome_success_with_omitted_code() {
        let response: BatchCreateResponse = serde_json::from_str(
            r#"{"newMediaItemResults":[{"uploadToken":"tok","status":{"message":"Success"},"mediaItem":{"id":"M1"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.outcome(),
            MediaItemCreation::Created {
                media_item_id: Some("M1".to_string())
            }
        );
    }

    #[test]
    fn test_outcome_success_with_explicit_zero_code() {
        let response: BatchCreateResponse = serde_json::from_str(
            r#"{"newMediaItemResults":[{"status":{"code":0,"message":"OK"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.outcome(),
            MediaItemCreation::Created {
                media_item_id: None
            }
        );
    }

    #[test]
    fn test_outcome_non_ok_code_carries_message() {
        let response: BatchCreateResponse = serde_json::from_str(
            r#"{"newMediaItemResults":[{"status":{"code":3,"message":"Invalid upload token"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.outcome(),
            MediaItemCreation::Failed {
                message: Some("Invalid upload token".to_string())
            }
        );
    }

    #[test]
    fn test_outcome_missing_status_or_results() {
        let no_status: BatchCreateResponse =
            serde_json::from_str(r#"{"newMediaItemResults":[{"uploadToken":"tok"}]}"#).unwrap();
        assert!(matches!(
            no_status.outcome(),
            MediaItemCreation::Failed { .. }
        ));

        let empty: BatchCreateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.outcome(), MediaItemCreation::Failed { .. }));
    }
}
