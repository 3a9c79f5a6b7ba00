// History store trait: async interface over the location history.
//
// Implementor: SqliteHistoryStore (wraps rusqlite). The analyzer only
// sees `Arc<dyn HistoryStore>`, so tests can hand it a store that fails.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::LocationRecord;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one immutable observation.
    async fn append_location(
        &self,
        ip: &str,
        timestamp: DateTime<Utc>,
        country: &str,
        city: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<()>;

    /// All observations for an IP, newest first. Empty for unknown IPs.
    async fn location_history(&self, ip: &str) -> Result<Vec<LocationRecord>>;

    /// Number of user tables (init confirmation).
    async fn table_count(&self) -> Result<i64>;

    /// Total stored observations across all IPs.
    async fn record_count(&self) -> Result<i64>;
}
