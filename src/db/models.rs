// Data models: Rust structs that map to database rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted observation of where an IP was located.
///
/// Rows are never updated or deleted; many rows per IP are expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub ip: String,
    pub timestamp: DateTime<Utc>,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}
