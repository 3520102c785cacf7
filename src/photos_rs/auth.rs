use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use crate::photos_rs::types::TokenResponse;

pub const PHOTOS_LIBRARY_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to load client secrets from {path}: {reason}")]
    ClientSecrets { path: String, reason: String },
    #[error("Authorization server rejected the request: {reason}")]
    Rejected { reason: String },
    #[error("Authorization was denied: {reason}")]
    Denied { reason: String },
    #[error("Authorization callback carried an unexpected state parameter")]
    StateMismatch,
    #[error("Authorization callback failed: {reason}")]
    Callback { reason: String },
    #[error("Timed out waiting for the user to authorize")]
    TimedOut,
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// OAuth client registration as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretsFile {
    Installed(ClientSecrets),
    Web(ClientSecrets),
}

impl ClientSecrets {
    /// Parse a `credentials.json` file in either the "installed" or "web" layout
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path).map_err(|e| AuthError::ClientSecrets {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents).map_err(|e| AuthError::ClientSecrets {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn from_json(contents: &str) -> serde_json::Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(contents)?;
        Ok(match file {
            ClientSecretsFile::Installed(secrets) | ClientSecretsFile::Web(secrets) => secrets,
        })
    }
}

/// Generate a cryptographically secure random string for PKCE
fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            const CHARSET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
            CHARSET[rng.random_range(0..CHARSET.len())] as char
        })
        .collect()
}

/// PKCE code verifier (43-128 characters)
pub fn generate_code_verifier() -> String {
    generate_random_string(128)
}

/// PKCE code challenge from verifier using S256
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Random state parameter for CSRF protection
pub fn generate_state() -> String {
    generate_random_string(16)
}

/// Build the consent URL the user opens in a browser.
///
/// Requests offline access so the token endpoint hands out a refresh token.
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    state: &str,
    code_challenge: &str,
) -> String {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
        ("scope", PHOTOS_LIBRARY_SCOPE),
        ("access_type", "offline"),
        ("prompt", "consent"),
        ("state", state),
        ("code_challenge", code_challenge),
        ("code_challenge_method", "S256"),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", secrets.auth_uri, query)
}

/// Exchange an authorization code for tokens
pub async fn exchange_code_for_token(
    client: &Client,
    secrets: &ClientSecrets,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<TokenResponse, AuthError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);
    params.insert("code_verifier", code_verifier);
    params.insert("client_id", secrets.client_id.as_str());
    params.insert("client_secret", secrets.client_secret.as_str());

    post_token_form(client, &secrets.token_uri, &params).await
}

/// Mint a new access token from a refresh token
pub async fn refresh_access_token(
    client: &Client,
    secrets: &ClientSecrets,
    refresh_token: &str,
) -> Result<TokenResponse, AuthError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);
    params.insert("client_id", secrets.client_id.as_str());
    params.insert("client_secret", secrets.client_secret.as_str());

    post_token_form(client, &secrets.token_uri, &params).await
}

async fn post_token_form(
    client: &Client,
    token_uri: &str,
    params: &HashMap<&str, &str>,
) -> Result<TokenResponse, AuthError> {
    let response = client
        .post(token_uri)
        // serializes to x-www-form-urlencoded and sets the header
        .form(params)
        .send()
        .await
        .map_err(AuthError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(AuthError::Rejected {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(AuthError::FailedToParseResponse)
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    expected_state: String,
    sender: mpsc::Sender<Result<String, AuthError>>,
}

async fn callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let result = match params {
        CallbackParams {
            error: Some(error), ..
        } => Err(AuthError::Denied { reason: error }),
        CallbackParams {
            code: Some(code),
            state: Some(received),
            ..
        } if received == state.expected_state => Ok(code),
        CallbackParams { code: Some(_), .. } => Err(AuthError::StateMismatch),
        CallbackParams { code: None, .. } => {
            return (
                StatusCode::BAD_REQUEST,
                Html("<p>Missing authorization code.</p>"),
            );
        }
    };

    let page = if result.is_ok() {
        Html("<p>Authorization complete. You can close this window.</p>")
    } else {
        Html("<p>Authorization failed. Check the uploader log for details.</p>")
    };
    // Only the first callback matters; later ones find the channel full or closed.
    let _ = state.sender.try_send(result);
    (StatusCode::OK, page)
}

/// Serve the loopback redirect target until the browser delivers a code.
pub async fn receive_authorization_code(
    listener: TcpListener,
    expected_state: &str,
    wait_for: Duration,
) -> Result<String, AuthError> {
    let (sender, mut receiver) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new().route("/", get(callback)).with_state(CallbackState {
        expected_state: expected_state.to_string(),
        sender,
    });

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let received = tokio::time::timeout(wait_for, receiver.recv()).await;
    let _ = shutdown_tx.send(());
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Authorization callback server stopped with an error")
        }
        Err(e) => tracing::warn!(error = %e, "Authorization callback server task failed"),
    }

    match received {
        Ok(Some(result)) => result,
        Ok(None) => Err(AuthError::Callback {
            reason: "Callback server stopped before receiving a code".to_string(),
        }),
        Err(_) => Err(AuthError::TimedOut),
    }
}
