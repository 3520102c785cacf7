use url::Url;

pub mod albums;
pub mod auth;
pub mod error;
pub mod media_items;
pub mod types;

/// Docs:
/// https://developers.google.com/photos/library/reference/rest
pub const PHOTOS_API_BASE_URL: &str = "https://photoslibrary.googleapis.com/v1";

/// Append a single path segment to the API base, keeping any base path.
pub(crate) fn endpoint_url(base_url: &Url, segment: &str) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url
}
