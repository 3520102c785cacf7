pub mod provider;
pub mod store;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::photos_rs::types::TokenResponse;

/// Persisted OAuth credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a fresh token grant
    pub fn from_grant(grant: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expiry: expiry_after(now, grant.expires_in),
        }
    }

    /// Apply a refresh grant. Google usually omits the refresh token on refresh,
    /// in which case the existing one stays.
    pub fn refreshed(&self, grant: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or_else(|| self.refresh_token.clone()),
            expiry: expiry_after(now, grant.expires_in),
        }
    }

    /// Last instant the access token may be sent, given the safety margin
    pub fn usable_until(&self, safety_margin: TimeDelta) -> DateTime<Utc> {
        self.expiry - safety_margin
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>, safety_margin: TimeDelta) -> bool {
        now < self.usable_until(safety_margin)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"..")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| ".."))
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// An unrepresentable lifetime collapses to `now`, which forces a refresh.
fn expiry_after(now: DateTime<Utc>, expires_in: u64) -> DateTime<Utc> {
    i64::try_from(expires_in)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(now)
}
