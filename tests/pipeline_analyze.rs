// Pipeline tests: Analyzer wired to stub providers and a real SQLite store.
//
// Stubs count their calls so we can assert which providers ran. The store
// is an in-memory SQLite database, except where a deliberately broken
// store is used to check that history failures stay non-fatal.

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};

use ipcheck::db::models::LocationRecord;
use ipcheck::db::{initialize_in_memory, HistoryStore, SqliteHistoryStore};
use ipcheck::error::{AnalyzeError, ProviderError};
use ipcheck::output::persist::save_report;
use ipcheck::output::report::format_report;
use ipcheck::pipeline::analyze::Analyzer;
use ipcheck::providers::models::{DeviceInfo, GeoLocation, OwnerInfo, ThreatInfo};
use ipcheck::providers::traits::Provider;

/// A provider that returns a canned value (or fails) and counts calls.
struct Stub<T> {
    value: Option<T>,
    calls: Arc<AtomicUsize>,
}

impl<T> Stub<T> {
    fn new(value: Option<T>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                value,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Provider for Stub<T> {
    type Info = T;

    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch(&self, _ip: IpAddr) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.value
            .clone()
            .ok_or_else(|| ProviderError::Malformed("stubbed failure".to_string()))
    }
}

/// A store whose every operation fails.
struct BrokenStore;

#[async_trait]
impl HistoryStore for BrokenStore {
    async fn append_location(
        &self,
        _ip: &str,
        _timestamp: DateTime<Utc>,
        _country: &str,
        _city: &str,
        _latitude: f64,
        _longitude: f64,
    ) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    async fn location_history(&self, _ip: &str) -> anyhow::Result<Vec<LocationRecord>> {
        anyhow::bail!("database is locked")
    }

    async fn table_count(&self) -> anyhow::Result<i64> {
        anyhow::bail!("unavailable")
    }

    async fn record_count(&self) -> anyhow::Result<i64> {
        anyhow::bail!("unavailable")
    }
}

struct Harness {
    analyzer: Analyzer,
    store: Arc<SqliteHistoryStore>,
    calls: Vec<Arc<AtomicUsize>>,
}

impl Harness {
    fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }
}

fn harness(
    owner: Option<OwnerInfo>,
    threat: Option<ThreatInfo>,
    device: Option<DeviceInfo>,
    geo: Option<Option<GeoLocation>>,
) -> Harness {
    let store = Arc::new(SqliteHistoryStore::new(initialize_in_memory().unwrap()));
    let (owner, owner_calls) = Stub::new(owner);
    let (threat, threat_calls) = Stub::new(threat);
    let (device, device_calls) = Stub::new(device);

    let mut analyzer = Analyzer::new(
        Box::new(owner),
        Box::new(threat),
        Box::new(device),
        store.clone(),
    );
    let mut calls = vec![owner_calls, threat_calls, device_calls];

    if let Some(geo) = geo {
        let (geo, geo_calls) = Stub::new(geo);
        analyzer = analyzer.with_geolocation(Box::new(geo));
        calls.push(geo_calls);
    }

    Harness {
        analyzer,
        store,
        calls,
    }
}

fn amsterdam() -> GeoLocation {
    GeoLocation {
        country: "Netherlands".to_string(),
        city: "Amsterdam".to_string(),
        latitude: 52.374,
        longitude: 4.8897,
    }
}

// ============================================================
// End-to-end scenarios
// ============================================================

#[tokio::test]
async fn suspicious_ip_without_geolocation_appends_nothing() {
    let h = harness(
        None,
        Some(ThreatInfo::new(75, 12, vec![], None)),
        None,
        None,
    );

    let result = h.analyzer.analyze("8.8.8.8").await.unwrap();
    assert!(result.owner.is_none());
    assert!(result.device.is_none());
    assert!(result.location_history.is_empty());

    let report = format_report(&result, Local::now());
    assert!(report.contains("Status: SUSPICIOUS"));
    assert!(report.contains("Trust Score: 75%"));
    assert!(report.contains("Number of Reports: 12"));

    assert_eq!(h.store.record_count().await.unwrap(), 0);
    assert_eq!(h.total_calls(), 3);
}

#[tokio::test]
async fn invalid_ip_touches_nothing() {
    let h = harness(
        Some(OwnerInfo::default()),
        Some(ThreatInfo::new(10, 0, vec![], None)),
        Some(DeviceInfo {
            location: Some(amsterdam()),
            ..DeviceInfo::default()
        }),
        Some(Some(amsterdam())),
    );
    let err = h.analyzer.analyze("not-an-ip").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::InvalidInput(ref raw) if raw == "not-an-ip"));

    assert_eq!(h.total_calls(), 0, "no provider may be called");
    assert_eq!(h.store.record_count().await.unwrap(), 0);
}

#[tokio::test]
async fn every_provider_failing_still_produces_a_report() {
    let h = harness(None, None, None, Some(None));

    let result = h.analyzer.analyze("192.0.2.1").await.unwrap();
    assert!(result.owner.is_none());
    assert!(result.threat.is_none());
    assert!(result.device.is_none());
    assert_eq!(h.total_calls(), 4);

    let report = format_report(&result, Local::now());
    assert!(report.contains("Organization: Not available"));
    assert!(!report.contains("THREAT ANALYSIS:"));
}

// ============================================================
// History recording
// ============================================================

#[tokio::test]
async fn geolocation_fix_is_recorded_and_shown_first() {
    let h = harness(Some(OwnerInfo::default()), None, None, Some(Some(amsterdam())));

    // Prior observation from an earlier run
    let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    h.store
        .append_location("8.8.8.8", earlier, "United States", "Ashburn", 39.0, -77.5)
        .await
        .unwrap();

    let result = h.analyzer.analyze("8.8.8.8").await.unwrap();
    assert_eq!(result.location_history.len(), 2);
    assert_eq!(result.location_history[0].city, "Amsterdam");
    assert_eq!(result.location_history[1].city, "Ashburn");
    assert_eq!(h.store.record_count().await.unwrap(), 2);
}

#[tokio::test]
async fn device_location_is_used_when_no_geolocation_provider() {
    let device = DeviceInfo {
        ports: vec![443],
        location: Some(amsterdam()),
        ..DeviceInfo::default()
    };
    let h = harness(None, None, Some(device), None);

    let result = h.analyzer.analyze("203.0.113.10").await.unwrap();
    assert_eq!(result.location_history.len(), 1);
    assert_eq!(result.location_history[0].ip, "203.0.113.10");
    assert_eq!(result.location_history[0].country, "Netherlands");
}

#[tokio::test]
async fn dedicated_geolocation_wins_over_device_location() {
    let device = DeviceInfo {
        location: Some(GeoLocation {
            city: "Stale City".to_string(),
            ..amsterdam()
        }),
        ..DeviceInfo::default()
    };
    let h = harness(None, None, Some(device), Some(Some(amsterdam())));

    let result = h.analyzer.analyze("203.0.113.10").await.unwrap();
    assert_eq!(result.location_history.len(), 1);
    assert_eq!(result.location_history[0].city, "Amsterdam");
}

#[tokio::test]
async fn repeat_analyses_accumulate_history() {
    let h = harness(None, None, None, Some(Some(amsterdam())));

    for _ in 0..3 {
        h.analyzer.analyze("8.8.8.8").await.unwrap();
    }
    let result = h.analyzer.analyze("8.8.8.8").await.unwrap();
    assert_eq!(result.location_history.len(), 4);

    let times: Vec<_> = result.location_history.iter().map(|r| r.timestamp).collect();
    assert!(times.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn ipv6_history_uses_canonical_form() {
    let h = harness(None, None, None, Some(Some(amsterdam())));

    h.analyzer.analyze("2001:0db8:0000::0001").await.unwrap();
    let history = h.analyzer.history("2001:db8::1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ip, "2001:db8::1");
}

#[tokio::test]
async fn broken_store_degrades_to_empty_history() {
    let (owner, _) = Stub::new(Some(OwnerInfo::default()));
    let (threat, _) = Stub::new(Some(ThreatInfo::new(60, 2, vec![], None)));
    let (device, _) = Stub::new(None::<DeviceInfo>);
    let (geo, _) = Stub::new(Some(amsterdam()));

    let analyzer = Analyzer::new(
        Box::new(owner),
        Box::new(threat),
        Box::new(device),
        Arc::new(BrokenStore),
    )
    .with_geolocation(Box::new(geo));

    let result = analyzer.analyze("8.8.8.8").await.unwrap();
    assert!(result.threat.is_some());
    assert!(result.location_history.is_empty());

    assert!(analyzer.history("8.8.8.8").await.unwrap().is_empty());
}

#[tokio::test]
async fn history_rejects_invalid_ip() {
    let h = harness(None, None, None, None);
    assert!(h.analyzer.history("999.1.1.1").await.is_err());
}

// ============================================================
// Report persistence after analysis
// ============================================================

#[tokio::test]
async fn report_is_saved_after_successful_analysis() {
    let h = harness(Some(OwnerInfo::default()), None, None, None);
    let dir = tempfile::tempdir().unwrap();

    let result = h.analyzer.analyze("1.1.1.1").await.unwrap();
    let now = Local::now();
    let text = format_report(&result, now);
    let path = save_report(dir.path(), &result.ip, &text, now).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("ip_analysis_1.1.1.1_"));
    assert!(name.ends_with(".txt"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
}
