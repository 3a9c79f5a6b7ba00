// AbuseIPDB reputation lookup.
//
// `GET /api/v2/check` returns an abuse confidence score (0-100), the number
// of reports in the lookback window, and (with `verbose`) the individual
// reports with their numeric category ids.
//
// API docs: https://docs.abuseipdb.com/#check-endpoint

use std::collections::BTreeSet;
use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::models::ThreatInfo;
use super::traits::Provider;
use crate::error::ProviderError;

pub const API_KEY_VAR: &str = "ABUSEIPDB_API_KEY";

/// AbuseIPDB threat lookup. Without an API key every fetch short-circuits.
pub struct AbuseIpDbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_age_days: u32,
}

impl AbuseIpDbClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>, max_age_days: u32) -> Self {
        Self {
            client,
            base_url: super::normalize_base_url(base_url),
            api_key,
            max_age_days,
        }
    }
}

#[async_trait]
impl Provider for AbuseIpDbClient {
    type Info = ThreatInfo;

    fn name(&self) -> &'static str {
        "abuseipdb"
    }

    async fn fetch(&self, ip: IpAddr) -> Result<ThreatInfo, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingCredential {
                provider: "AbuseIPDB",
                env_var: API_KEY_VAR,
            });
        };

        let url = format!("{}/api/v2/check", self.base_url);
        let request = self
            .client
            .get(&url)
            .header("Key", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("ipAddress", ip.to_string()),
                ("maxAgeInDays", self.max_age_days.to_string()),
                ("verbose", String::new()),
            ]);

        let response: CheckResponse = super::get_json(request).await?;
        threat_from_check(response.data)
    }
}

/// Map the `data` object of a check response into ThreatInfo.
pub fn threat_from_check(data: CheckData) -> Result<ThreatInfo, ProviderError> {
    let score = u8::try_from(data.abuse_confidence_score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| {
            ProviderError::Malformed(format!(
                "abuseConfidenceScore out of range: {}",
                data.abuse_confidence_score
            ))
        })?;

    // Category ids across all reports, de-duplicated and in id order
    let ids: BTreeSet<u32> = data
        .reports
        .iter()
        .flat_map(|r| r.categories.iter().copied())
        .collect();
    let categories = ids.into_iter().map(category_label).collect();

    Ok(ThreatInfo::new(
        score,
        data.total_reports,
        categories,
        data.last_reported_at,
    ))
}

/// Human-readable label for an AbuseIPDB report category id.
pub fn category_label(id: u32) -> String {
    let label = match id {
        1 => "DNS Compromise",
        2 => "DNS Poisoning",
        3 => "Fraud Orders",
        4 => "DDoS Attack",
        5 => "FTP Brute-Force",
        6 => "Ping of Death",
        7 => "Phishing",
        8 => "Fraud VoIP",
        9 => "Open Proxy",
        10 => "Web Spam",
        11 => "Email Spam",
        12 => "Blog Spam",
        13 => "VPN IP",
        14 => "Port Scan",
        15 => "Hacking",
        16 => "SQL Injection",
        17 => "Spoofing",
        18 => "Brute-Force",
        19 => "Bad Web Bot",
        20 => "Exploited Host",
        21 => "Web App Attack",
        22 => "SSH",
        23 => "IoT Targeted",
        other => return format!("Category {other}"),
    };
    label.to_string()
}

// --- AbuseIPDB response types ---

#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    pub data: CheckData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckData {
    pub abuse_confidence_score: i64,
    pub total_reports: u32,
    pub last_reported_at: Option<String>,
    #[serde(default)]
    pub reports: Vec<AbuseReport>,
}

#[derive(Debug, Deserialize)]
pub struct AbuseReport {
    #[serde(default)]
    pub categories: Vec<u32>,
}
