use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::photos_rs::types::AccessToken;
use crate::ports::oauth::AuthorizationClient;
use crate::services::credentials::Credential;
use crate::services::credentials::store::CredentialStore;

/// Tokens are treated as expired this long before their real expiry.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("No usable credential: {reason}")]
    CredentialUnavailable { reason: String },
}

struct CachedToken {
    token: AccessToken,
    usable_until: DateTime<Utc>,
}

#[derive(Default)]
struct TokenState {
    cached: Option<CachedToken>,
    /// Access token the remote side answered 401 to; never handed out again.
    rejected: Option<String>,
}

/// Hands out a currently-valid access token, refreshing or re-authorizing behind the scenes.
///
/// The state lock is held for the whole acquisition so concurrent callers share one refresh.
pub struct TokenProvider<S, A> {
    store: S,
    authorizer: A,
    safety_margin: TimeDelta,
    state: Mutex<TokenState>,
}

impl<S: CredentialStore, A: AuthorizationClient> TokenProvider<S, A> {
    pub fn new(store: S, authorizer: A) -> Self {
        Self {
            store,
            authorizer,
            safety_margin: TimeDelta::seconds(TOKEN_SAFETY_MARGIN_SECS),
            state: Mutex::new(TokenState::default()),
        }
    }

    pub async fn get_access_token(&self) -> Result<AccessToken, TokenError> {
        let mut state = self.state.lock().await;

        if let Some(cached) = &state.cached
            && Utc::now() < cached.usable_until
        {
            return Ok(cached.token.clone());
        }
        state.cached = None;

        let credential = self.acquire(state.rejected.as_deref()).await?;
        Ok(Self::remember(&mut state, &credential, self.safety_margin))
    }

    /// Drop the cached token after the remote side rejected it. Disk is left alone.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.cached.take() {
            state.rejected = Some(cached.token.as_str().to_string());
        }
        tracing::debug!("Access token cache invalidated");
    }

    /// Run the consent flow unconditionally and store the result.
    pub async fn reauthorize(&self) -> Result<AccessToken, TokenError> {
        let mut state = self.state.lock().await;
        let credential = self.authorize_interactively().await?;
        Ok(Self::remember(&mut state, &credential, self.safety_margin))
    }

    fn remember(
        state: &mut TokenState,
        credential: &Credential,
        safety_margin: TimeDelta,
    ) -> AccessToken {
        let token = AccessToken::new(credential.access_token.clone());
        state.rejected = None;
        state.cached = Some(CachedToken {
            token: token.clone(),
            usable_until: credential.usable_until(safety_margin),
        });
        token
    }

    async fn acquire(&self, rejected: Option<&str>) -> Result<Credential, TokenError> {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential is unusable, treating it as absent");
                None
            }
        };

        if let Some(credential) = stored {
            let was_rejected = rejected == Some(credential.access_token.as_str());
            if !was_rejected && credential.is_usable_at(Utc::now(), self.safety_margin) {
                tracing::debug!(expiry = %credential.expiry, "Using stored access token");
                return Ok(credential);
            }

            if let Some(refresh_token) = credential.refresh_token.as_deref() {
                match self.authorizer.refresh_access_token(refresh_token).await {
                    Ok(grant) => {
                        let refreshed = credential.refreshed(grant, Utc::now());
                        tracing::info!(expiry = %refreshed.expiry, "Refreshed access token");
                        self.persist(&refreshed).await;
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Token refresh failed, falling back to interactive authorization");
                    }
                }
            }
        }

        self.authorize_interactively().await
    }

    async fn authorize_interactively(&self) -> Result<Credential, TokenError> {
        let grant = self
            .authorizer
            .authorize_interactively()
            .await
            .map_err(|e| TokenError::CredentialUnavailable {
                reason: e.to_string(),
            })?;
        let credential = Credential::from_grant(grant, Utc::now());
        if credential.refresh_token.is_none() {
            tracing::warn!("Authorization returned no refresh token; consent will be needed again at expiry");
        }
        tracing::info!(expiry = %credential.expiry, "Obtained new credential");
        self.persist(&credential).await;
        Ok(credential)
    }

    /// A failed save keeps the in-memory token usable for this run.
    async fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save(credential).await {
            tracing::error!(error = %e, "Failed to persist credential");
        }
    }
}
