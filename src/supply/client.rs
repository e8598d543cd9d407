use anyhow::{Context, Result};
use std::time::Duration;

/// Create the HTTP client used for product API requests
pub fn create_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("market-match/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}
