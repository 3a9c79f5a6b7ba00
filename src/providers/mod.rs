// Provider adapters: one per external intelligence service.
//
// Every adapter implements the Provider trait. The analyzer never calls
// `fetch` directly; it goes through `fetch_or_degrade`, which is the single
// place where a provider failure becomes an "unavailable" section.

pub mod abuseipdb;
pub mod geolocation;
pub mod models;
pub mod rdap;
pub mod shodan;
pub mod traits;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::output::truncate_chars;

/// Build the HTTP client shared by all adapters.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("ipcheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Send a request and decode a JSON body.
///
/// Non-2xx responses become `ProviderError::Status` (with a short body
/// excerpt), undecodable bodies become `ProviderError::Malformed`.
pub(crate) async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status,
            body: truncate_chars(body.trim(), 200),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Trim a trailing slash so `format!("{base}/path")` never doubles it.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
