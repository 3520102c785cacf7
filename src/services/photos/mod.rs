pub mod client;
pub mod oauth_client;

use std::time::Duration;

use color_eyre::eyre::{Context, Result};

/// Shared HTTP client; every remote call is bounded by `request_timeout`.
pub fn build_http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .wrap_err("Failed to build HTTP client")
}
