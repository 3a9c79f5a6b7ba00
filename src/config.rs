use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_RDAP_URL: &str = "https://rdap.org";
pub const DEFAULT_ABUSEIPDB_URL: &str = "https://api.abuseipdb.com";
pub const DEFAULT_SHODAN_URL: &str = "https://api.shodan.io";
pub const DEFAULT_GEO_URL: &str = "http://ip-api.com";
pub const DEFAULT_MAX_AGE_DAYS: u32 = 90;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Central configuration loaded from environment variables.
///
/// API keys come from env vars (never hardcoded). The .env file is loaded
/// at startup via dotenvy. Both keys are optional: a missing key only
/// turns its report section into "unavailable".
#[derive(Debug, Clone)]
pub struct Config {
    /// AbuseIPDB key (ABUSEIPDB_API_KEY)
    pub abuseipdb_api_key: Option<String>,
    /// Shodan key (SHODAN_API_KEY)
    pub shodan_api_key: Option<String>,
    /// Root for results/, logs/ and db/
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub rdap_url: String,
    pub abuseipdb_url: String,
    pub shodan_url: String,
    pub geo_url: String,
    /// Whether the dedicated geolocation lookup runs at all
    pub geolocation_enabled: bool,
    /// AbuseIPDB lookback window in days
    pub max_age_days: u32,
    /// Upper bound on each provider call
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let data_dir = env::var("IPCHECK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let db_path = env::var("IPCHECK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("db").join("ip_history.db"));

        let geolocation_enabled = match env::var("IPCHECK_GEOLOCATION").as_deref() {
            Ok("off") | Ok("false") | Ok("0") => false,
            // "on" or unset both enable it
            _ => true,
        };

        let max_age_days = match env::var("IPCHECK_MAX_AGE_DAYS") {
            Ok(raw) => parse_positive("IPCHECK_MAX_AGE_DAYS", &raw)?,
            Err(_) => DEFAULT_MAX_AGE_DAYS,
        };
        let http_timeout = match env::var("IPCHECK_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = parse_positive("IPCHECK_HTTP_TIMEOUT_SECS", &raw)?;
                Duration::from_secs(u64::from(secs))
            }
            Err(_) => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            abuseipdb_api_key: non_empty_var("ABUSEIPDB_API_KEY"),
            shodan_api_key: non_empty_var("SHODAN_API_KEY"),
            data_dir,
            db_path,
            rdap_url: env::var("IPCHECK_RDAP_URL").unwrap_or_else(|_| DEFAULT_RDAP_URL.to_string()),
            abuseipdb_url: env::var("IPCHECK_ABUSEIPDB_URL")
                .unwrap_or_else(|_| DEFAULT_ABUSEIPDB_URL.to_string()),
            shodan_url: env::var("IPCHECK_SHODAN_URL")
                .unwrap_or_else(|_| DEFAULT_SHODAN_URL.to_string()),
            geo_url: env::var("IPCHECK_GEO_URL").unwrap_or_else(|_| DEFAULT_GEO_URL.to_string()),
            geolocation_enabled,
            max_age_days,
            http_timeout,
        })
    }

    /// Directory where rendered reports are written.
    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join("results")
    }

    /// Directory for the rolling log file.
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

impl Default for Config {
    /// Defaults with no API keys, rooted at ./data.
    fn default() -> Self {
        let data_dir = PathBuf::from("./data");
        Self {
            abuseipdb_api_key: None,
            shodan_api_key: None,
            db_path: data_dir.join("db").join("ip_history.db"),
            data_dir,
            rdap_url: DEFAULT_RDAP_URL.to_string(),
            abuseipdb_url: DEFAULT_ABUSEIPDB_URL.to_string(),
            shodan_url: DEFAULT_SHODAN_URL.to_string(),
            geo_url: DEFAULT_GEO_URL.to_string(),
            geolocation_enabled: true,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Read an env var, treating empty or whitespace-only values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a setting that must be a whole number greater than zero.
fn parse_positive(name: &str, raw: &str) -> Result<u32> {
    let value: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a positive integer, got {raw:?}"))?;
    if value == 0 {
        bail!("{name} must be a positive integer, got 0");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.results_dir(), PathBuf::from("./data/results"));
        assert_eq!(config.logs_dir(), PathBuf::from("./data/logs"));
        assert_eq!(config.db_path, PathBuf::from("./data/db/ip_history.db"));
        assert_eq!(config.max_age_days, 90);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.abuseipdb_api_key.is_none());
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("X", "30").unwrap(), 30);
        assert_eq!(parse_positive("X", " 7 ").unwrap(), 7);
        assert!(parse_positive("X", "0").is_err());
        assert!(parse_positive("X", "-5").is_err());
        assert!(parse_positive("X", "soon").is_err());
    }

    #[test]
    fn test_zero_timeout_error_names_the_variable() {
        let err = parse_positive("IPCHECK_HTTP_TIMEOUT_SECS", "0").unwrap_err();
        assert!(err.to_string().contains("IPCHECK_HTTP_TIMEOUT_SECS"));
    }
}
