// Provider trait: the shared "fetch info for an IP" capability.
//
// Each adapter produces its own typed result (`Info`). Failures are typed
// too, so `fetch_or_degrade` can tell a missing API key (a warning) from a
// broken service (an error).

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::ProviderError;

/// An external intelligence service queried once per analysis.
#[async_trait]
pub trait Provider: Send + Sync {
    type Info: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Query the service for `ip` and map its answer into `Info`.
    async fn fetch(&self, ip: IpAddr) -> Result<Self::Info, ProviderError>;
}

/// Run a provider, bounded by `timeout`, and turn any failure into `None`.
///
/// Missing credentials are logged as warnings, everything else as errors.
/// Nothing propagates past this point.
pub async fn fetch_or_degrade<P>(provider: &P, ip: IpAddr, timeout: Duration) -> Option<P::Info>
where
    P: Provider + ?Sized,
{
    let outcome = match tokio::time::timeout(timeout, provider.fetch(ip)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout)),
    };

    match outcome {
        Ok(info) => {
            debug!(provider = provider.name(), ip = %ip, "Provider lookup succeeded");
            Some(info)
        }
        Err(e) if e.is_configuration() => {
            warn!(provider = provider.name(), "{e}");
            None
        }
        Err(e) => {
            error!(provider = provider.name(), ip = %ip, error = %e, "Provider lookup failed");
            None
        }
    }
}
