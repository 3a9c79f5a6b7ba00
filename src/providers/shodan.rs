// Shodan host lookup.
//
// `GET /shodan/host/{ip}` returns everything Shodan's crawlers have seen on
// the host: open ports, per-port banners (with a detected `product`), OS
// fingerprint, known CVEs, and where the host is located.

use std::collections::BTreeMap;
use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::models::{DeviceInfo, GeoLocation};
use super::traits::Provider;
use crate::error::ProviderError;

pub const API_KEY_VAR: &str = "SHODAN_API_KEY";

/// Shodan device lookup. Without an API key every fetch short-circuits.
pub struct ShodanClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ShodanClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: super::normalize_base_url(base_url),
            api_key,
        }
    }
}

#[async_trait]
impl Provider for ShodanClient {
    type Info = DeviceInfo;

    fn name(&self) -> &'static str {
        "shodan"
    }

    async fn fetch(&self, ip: IpAddr) -> Result<DeviceInfo, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingCredential {
                provider: "Shodan",
                env_var: API_KEY_VAR,
            });
        };

        let url = format!("{}/shodan/host/{}", self.base_url, ip);
        let request = self.client.get(&url).query(&[("key", api_key)]);

        let host: ShodanHost = super::get_json(request).await?;
        Ok(device_from_host(host))
    }
}

/// Map a Shodan host record into DeviceInfo. Missing fields become empty
/// sequences or None.
pub fn device_from_host(host: ShodanHost) -> DeviceInfo {
    let hostname = host
        .hostnames
        .into_iter()
        .next()
        .or(host.hostname)
        .filter(|h| !h.is_empty());

    // One entry per distinct product, in banner order
    let mut services: Vec<String> = Vec::new();
    for product in host.data.into_iter().filter_map(|b| b.product) {
        if !product.is_empty() && !services.contains(&product) {
            services.push(product);
        }
    }

    let vulns = match host.vulns {
        Some(Vulns::List(mut ids)) => {
            ids.sort();
            ids.dedup();
            ids
        }
        Some(Vulns::Keyed(map)) => map.into_keys().collect(),
        None => Vec::new(),
    };

    let location = match (host.latitude, host.longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoLocation {
            country: host.country_name.unwrap_or_else(|| "Unknown".to_string()),
            city: host.city.unwrap_or_else(|| "Unknown".to_string()),
            latitude,
            longitude,
        }),
        _ => None,
    };

    let mut ports = host.ports;
    ports.sort_unstable();
    ports.dedup();

    DeviceInfo {
        hostname,
        ports,
        services,
        os: host.os.filter(|os| !os.is_empty()),
        vulns,
        location,
    }
}

// --- Shodan response types ---

#[derive(Debug, Deserialize)]
pub struct ShodanHost {
    #[serde(default)]
    pub hostnames: Vec<String>,
    /// Older responses carry a single hostname
    pub hostname: Option<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub data: Vec<ShodanBanner>,
    pub os: Option<String>,
    pub vulns: Option<Vulns>,
    pub country_name: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ShodanBanner {
    pub port: Option<u16>,
    pub product: Option<String>,
}

/// Host records list CVE ids; banner-level records key details by CVE id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Vulns {
    List(Vec<String>),
    Keyed(BTreeMap<String, Value>),
}
