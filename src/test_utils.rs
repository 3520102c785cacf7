use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Utc};

use crate::photos_rs::types::TokenResponse;
use crate::services::credentials::Credential;

/// Smallest header `infer` recognises as JPEG
pub const JPEG_BYTES: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
];

/// Credential whose expiry is `expires_in` from now (negative for already expired)
pub fn credential(access: &str, refresh: Option<&str>, expires_in: TimeDelta) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expiry: Utc::now() + expires_in,
    }
}

pub fn token_response(access: &str, refresh: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        expires_in: 3599,
        refresh_token: refresh.map(str::to_string),
        scope: None,
        token_type: Some("Bearer".to_string()),
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
