use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tokio::net::TcpListener;

use crate::photos_rs::auth::{
    AuthError, ClientSecrets, authorization_url, exchange_code_for_token,
    generate_code_challenge, generate_code_verifier, generate_state, receive_authorization_code,
    refresh_access_token,
};
use crate::photos_rs::types::TokenResponse;
use crate::ports::oauth::AuthorizationClient;

/// How long the loopback listener waits for the user to finish consenting.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Google OAuth adapter.
///
/// Client secrets are read lazily on each exchange, so a missing `credentials.json`
/// only matters once a refresh or consent is actually needed.
pub struct GoogleOAuthAdapter {
    client: Client,
    client_secrets_path: PathBuf,
    redirect_port: u16,
}

impl GoogleOAuthAdapter {
    pub fn new(client: Client, client_secrets_path: PathBuf, redirect_port: u16) -> Self {
        Self {
            client,
            client_secrets_path,
            redirect_port,
        }
    }

    fn secrets(&self) -> Result<ClientSecrets, AuthError> {
        ClientSecrets::from_file(&self.client_secrets_path)
    }
}

#[async_trait::async_trait]
impl AuthorizationClient for GoogleOAuthAdapter {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let secrets = self.secrets()?;
        refresh_access_token(&self.client, &secrets, refresh_token).await
    }

    async fn authorize_interactively(&self) -> Result<TokenResponse, AuthError> {
        let secrets = self.secrets()?;

        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port))
            .await
            .map_err(|e| AuthError::Callback {
                reason: format!(
                    "Failed to bind loopback port {}: {}",
                    self.redirect_port, e
                ),
            })?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Callback {
                reason: e.to_string(),
            })?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let code_verifier = generate_code_verifier();
        let state = generate_state();
        let auth_url = authorization_url(
            &secrets,
            &redirect_uri,
            &state,
            &generate_code_challenge(&code_verifier),
        );

        tracing::warn!(url = %auth_url, "Authorization required, waiting for browser consent");
        println!("Open this URL in your browser to authorize photo uploads:\n\n{}\n", auth_url);

        let code = receive_authorization_code(listener, &state, CONSENT_TIMEOUT).await?;
        tracing::info!("Authorization code received, exchanging for tokens");

        exchange_code_for_token(&self.client, &secrets, &code, &redirect_uri, &code_verifier).await
    }
}
