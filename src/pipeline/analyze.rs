// IP analysis pipeline.
//
// For one IP address this:
// 1. Validates the input (nothing else happens for an invalid IP)
// 2. Queries ownership, threat, device and geolocation providers concurrently
// 3. Records a location observation if any provider produced coordinates
// 4. Loads the stored location history for the IP
// 5. Returns everything as one AnalysisResult
//
// Provider and storage failures never fail the analysis; they only leave
// their part of the result empty.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::config::{Config, DEFAULT_HTTP_TIMEOUT};
use crate::db::models::LocationRecord;
use crate::db::HistoryStore;
use crate::error::AnalyzeError;
use crate::providers::abuseipdb::AbuseIpDbClient;
use crate::providers::geolocation::GeoIpClient;
use crate::providers::models::{DeviceInfo, GeoLocation, OwnerInfo, ThreatInfo};
use crate::providers::rdap::RdapClient;
use crate::providers::shodan::ShodanClient;
use crate::providers::traits::{fetch_or_degrade, Provider};
use crate::validate::parse_ip;

/// Everything known about one IP after a single analysis.
///
/// `None` means the provider was unavailable (no key, failure, timeout).
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub ip: IpAddr,
    pub owner: Option<OwnerInfo>,
    pub threat: Option<ThreatInfo>,
    pub device: Option<DeviceInfo>,
    /// Newest first; includes the observation recorded by this analysis.
    pub location_history: Vec<LocationRecord>,
}

/// Runs analyses against a fixed set of providers and a history store.
pub struct Analyzer {
    owner: Box<dyn Provider<Info = OwnerInfo>>,
    threat: Box<dyn Provider<Info = ThreatInfo>>,
    device: Box<dyn Provider<Info = DeviceInfo>>,
    geolocation: Option<Box<dyn Provider<Info = GeoLocation>>>,
    store: Arc<dyn HistoryStore>,
    timeout: Duration,
}

impl Analyzer {
    /// Build an analyzer from explicit parts, without a dedicated
    /// geolocation provider.
    pub fn new(
        owner: Box<dyn Provider<Info = OwnerInfo>>,
        threat: Box<dyn Provider<Info = ThreatInfo>>,
        device: Box<dyn Provider<Info = DeviceInfo>>,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            owner,
            threat,
            device,
            geolocation: None,
            store,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_geolocation(mut self, provider: Box<dyn Provider<Info = GeoLocation>>) -> Self {
        self.geolocation = Some(provider);
        self
    }

    /// Upper bound on each individual provider call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wire up the real HTTP providers from configuration.
    pub fn from_config(config: &Config, store: Arc<dyn HistoryStore>) -> Result<Self> {
        let client = crate::providers::http_client()?;

        let analyzer = Self::new(
            Box::new(RdapClient::new(client.clone(), &config.rdap_url)),
            Box::new(AbuseIpDbClient::new(
                client.clone(),
                &config.abuseipdb_url,
                config.abuseipdb_api_key.clone(),
                config.max_age_days,
            )),
            Box::new(ShodanClient::new(
                client.clone(),
                &config.shodan_url,
                config.shodan_api_key.clone(),
            )),
            store,
        )
        .with_timeout(config.http_timeout);

        if config.geolocation_enabled {
            Ok(analyzer.with_geolocation(Box::new(GeoIpClient::new(client, &config.geo_url))))
        } else {
            info!("Geolocation lookup disabled");
            Ok(analyzer)
        }
    }

    /// Analyze one IP address.
    ///
    /// Only an invalid IP is an error. Every other failure degrades the
    /// affected section and is logged.
    pub async fn analyze(&self, ip: &str) -> Result<AnalysisResult, AnalyzeError> {
        let ip = match parse_ip(ip) {
            Ok(ip) => ip,
            Err(e) => {
                error!(input = ip, "Invalid IP address");
                return Err(e);
            }
        };

        info!(ip = %ip, "Analyzing IP address");

        let geolocation = async {
            match &self.geolocation {
                Some(provider) => fetch_or_degrade(provider.as_ref(), ip, self.timeout).await,
                None => None,
            }
        };

        let (owner, threat, device, geolocation) = tokio::join!(
            fetch_or_degrade(self.owner.as_ref(), ip, self.timeout),
            fetch_or_degrade(self.threat.as_ref(), ip, self.timeout),
            fetch_or_degrade(self.device.as_ref(), ip, self.timeout),
            geolocation,
        );

        // Dedicated geolocation wins; the device record is the fallback
        let location = geolocation.or_else(|| device.as_ref().and_then(|d| d.location.clone()));

        let key = ip.to_string();
        if let Some(location) = &location {
            self.record_location(&key, location).await;
        }

        let location_history = self.load_history(&key).await;

        info!(
            ip = %ip,
            owner = owner.is_some(),
            threat = threat.is_some(),
            device = device.is_some(),
            history = location_history.len(),
            "Analysis complete"
        );

        Ok(AnalysisResult {
            ip,
            owner,
            threat,
            device,
            location_history,
        })
    }

    /// Stored history for an IP without contacting any provider.
    pub async fn history(&self, ip: &str) -> Result<Vec<LocationRecord>, AnalyzeError> {
        let ip = parse_ip(ip)?;
        Ok(self.load_history(&ip.to_string()).await)
    }

    /// Append an observation. History is best-effort: failures are logged only.
    async fn record_location(&self, ip: &str, location: &GeoLocation) {
        let result = self
            .store
            .append_location(
                ip,
                Utc::now(),
                &location.country,
                &location.city,
                location.latitude,
                location.longitude,
            )
            .await;

        if let Err(e) = result {
            error!(ip = ip, error = %e, "Failed to store location history");
        }
    }

    /// Read history, degrading a storage failure to an empty list.
    async fn load_history(&self, ip: &str) -> Vec<LocationRecord> {
        match self.store.location_history(ip).await {
            Ok(history) => history,
            Err(e) => {
                error!(ip = ip, error = %e, "Failed to read location history");
                Vec::new()
            }
        }
    }
}
