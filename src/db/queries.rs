// Database queries: the only place SQL touching ip_history lives.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{params, Connection};
use tracing::warn;

use super::models::LocationRecord;

/// Naive ISO 8601, as Python's `datetime.isoformat()` writes it.
const LEGACY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Render a timestamp the way it is stored: fixed-width RFC 3339 in UTC,
/// so that text ordering in SQL matches chronological ordering.
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Append one location observation. Rows are never updated afterwards.
pub fn append_location(
    conn: &Connection,
    ip: &str,
    timestamp: DateTime<Utc>,
    country: &str,
    city: &str,
    latitude: f64,
    longitude: f64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO ip_history (ip, timestamp, country, city, latitude, longitude)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            ip,
            encode_timestamp(timestamp),
            country,
            city,
            latitude,
            longitude
        ],
    )?;
    Ok(())
}

/// All observations for an IP, newest first. Unknown IPs give an empty Vec.
///
/// Rows sharing a timestamp come back newest insert first. Rows with an
/// unreadable timestamp are skipped with a warning.
pub fn location_history(conn: &Connection, ip: &str) -> Result<Vec<LocationRecord>> {
    let mut stmt = conn.prepare(
        "SELECT ip, timestamp, country, city, latitude, longitude
         FROM ip_history
         WHERE ip = ?1
         ORDER BY timestamp DESC, rowid DESC",
    )?;

    let rows = stmt.query_map(params![ip], |row| {
        let raw: Option<String> = row.get(1)?;
        let Some(timestamp) = raw.as_deref().and_then(decode_timestamp) else {
            warn!(ip = ip, timestamp = ?raw, "Skipping history row with unreadable timestamp");
            return Ok(None);
        };
        Ok(Some(LocationRecord {
            ip: row.get(0)?,
            timestamp,
            country: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            city: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            latitude: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
            longitude: row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
        }))
    })?;

    let mut history = Vec::new();
    for row in rows {
        if let Some(record) = row? {
            history.push(record);
        }
    }

    // Legacy local-time rows don't sort lexically against UTC ones.
    // Stable, so equal timestamps keep the rowid order from SQL.
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(history)
}

/// Parse a stored timestamp: RFC 3339, or the naive local ISO 8601 form
/// (`2024-05-01T10:00:00.123456`) written by older versions of the tool.
pub fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT).ok()?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        // Inside a DST gap there is no such local time; read it as UTC
        .unwrap_or_else(|| naive.and_utc());
    Some(local)
}

/// Total number of stored observations across all IPs.
pub fn record_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM ip_history", [], |row| row.get(0))?;
    Ok(count)
}
