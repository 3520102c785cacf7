use crate::photos_rs::auth::AuthError;
use crate::photos_rs::types::TokenResponse;

/// Port trait for the OAuth authorization server.
///
/// `services::photos::oauth_client` talks to Google; tests use the generated mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthorizationClient: Send + Sync {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;

    /// Run the one-time user consent flow.
    async fn authorize_interactively(&self) -> Result<TokenResponse, AuthError>;
}
