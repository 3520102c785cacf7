use reqwest::{Response, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request was not authorized (HTTP 401)")]
    Unauthorized,
    #[error("Request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to send http request: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Failed to parse response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Split a response into success and the typed failure variants.
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }
    Ok(response)
}
