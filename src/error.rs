// Error types shared across the analysis pipeline.
//
// Only `AnalyzeError` ever escapes `Analyzer::analyze`. `ProviderError` stays
// inside the provider layer, where `fetch_or_degrade` turns it into a logged
// "unavailable" section.

use std::time::Duration;

use thiserror::Error;

/// Hard failures of a whole analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The input is not an IPv4 or IPv6 literal. Nothing else was attempted.
    #[error("invalid IP address: {0:?}")]
    InvalidInput(String),
}

/// Why a single provider could not produce its section.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key not configured ({env_var})")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    /// Never carries the request URL, which may hold an API key.
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Transport(e.without_url())
    }
}

impl ProviderError {
    /// Missing credentials are a configuration choice, not a failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::MissingCredential { .. })
    }
}
