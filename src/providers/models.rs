// Typed results produced by the provider adapters.
//
// None of these are persisted except through LocationRecord; they live for
// one analysis and are then rendered into the report.

use serde::{Deserialize, Serialize};

/// Placeholder shown for any value a provider could not supply.
pub const NOT_AVAILABLE: &str = "Not available";

/// Confidence scores strictly above this are treated as malicious.
pub const MALICIOUS_THRESHOLD: u8 = 50;

/// Registry ownership data for the network containing the IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerInfo {
    /// Always present; "Not available" when the registry names nobody.
    pub organization: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
}

impl Default for OwnerInfo {
    fn default() -> Self {
        Self {
            organization: NOT_AVAILABLE.to_string(),
            name: None,
            email: None,
            phone: None,
            address: None,
            created_date: None,
            updated_date: None,
        }
    }
}

/// Abuse-report reputation for the IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatInfo {
    /// Derived from `confidence_score`; see `ThreatInfo::new`.
    pub is_malicious: bool,
    /// 0-100
    pub confidence_score: u8,
    pub recent_reports: u32,
    pub categories: Vec<String>,
    pub last_reported: Option<String>,
}

impl ThreatInfo {
    pub fn new(
        confidence_score: u8,
        recent_reports: u32,
        categories: Vec<String>,
        last_reported: Option<String>,
    ) -> Self {
        Self {
            is_malicious: confidence_score > MALICIOUS_THRESHOLD,
            confidence_score,
            recent_reports,
            categories,
            last_reported,
        }
    }
}

/// What a host-intelligence service knows about the device behind the IP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub hostname: Option<String>,
    pub ports: Vec<u16>,
    pub services: Vec<String>,
    pub os: Option<String>,
    pub vulns: Vec<String>,
    /// Where the service last saw the host, if it reported coordinates.
    pub location: Option<GeoLocation>,
}

/// A single geolocation fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}
