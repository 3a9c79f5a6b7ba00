// SqliteHistoryStore: rusqlite backend implementing the HistoryStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::LocationRecord;
use super::traits::HistoryStore;

pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append_location(
        &self,
        ip: &str,
        timestamp: DateTime<Utc>,
        country: &str,
        city: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::append_location(&conn, ip, timestamp, country, city, latitude, longitude)
    }

    async fn location_history(&self, ip: &str) -> Result<Vec<LocationRecord>> {
        let conn = self.conn.lock().await;
        super::queries::location_history(&conn, ip)
    }

    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn record_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::record_count(&conn)
    }
}
