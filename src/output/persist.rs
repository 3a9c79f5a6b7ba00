// Report files: one text file per completed analysis.
//
// Files are named `ip_analysis_<ip>_<YYYYmmdd_HHMMSS>.txt` and are never
// overwritten: a second save in the same second gets a `_1`, `_2`... suffix.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{error, info};

/// Suffixes tried before giving up on a same-second collision.
const MAX_SUFFIX: u32 = 100;

/// File name stem for a report. IPv6 colons become dashes so the name is
/// portable.
pub fn report_file_stem(ip: &IpAddr, saved_at: DateTime<Local>) -> String {
    format!(
        "ip_analysis_{}_{}",
        ip.to_string().replace(':', "-"),
        saved_at.format("%Y%m%d_%H%M%S")
    )
}

/// Write `report` under `dir`. Returns the new file's path, or None (logged)
/// if anything went wrong. The report itself stays usable either way.
pub fn save_report(dir: &Path, ip: &IpAddr, report: &str, saved_at: DateTime<Local>) -> Option<PathBuf> {
    match write_report(dir, ip, report, saved_at) {
        Ok(path) => {
            info!(ip = %ip, path = %path.display(), "Report saved");
            Some(path)
        }
        Err(e) => {
            error!(ip = %ip, error = %format!("{e:#}"), "Failed to save report");
            None
        }
    }
}

fn write_report(dir: &Path, ip: &IpAddr, report: &str, saved_at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results directory {}", dir.display()))?;

    let stem = report_file_stem(ip, saved_at);
    for attempt in 0..MAX_SUFFIX {
        let name = if attempt == 0 {
            format!("{stem}.txt")
        } else {
            format!("{stem}_{attempt}.txt")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(report.as_bytes())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        }
    }

    anyhow::bail!("{MAX_SUFFIX} reports for {ip} already exist for this second")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_stem_embeds_ip_and_second() {
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        assert_eq!(report_file_stem(&ip, fixed_time()), "ip_analysis_8.8.8.8_20261019_140509");
    }

    #[test]
    fn test_stem_ipv6_has_no_colons() {
        let ip: IpAddr = "2001:db8::1".parse().unwrap();
        let stem = report_file_stem(&ip, fixed_time());
        assert!(!stem.contains(':'));
        assert!(stem.starts_with("ip_analysis_2001-db8--1_"));
    }

    #[test]
    fn test_save_writes_content_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        let ip: IpAddr = "8.8.8.8".parse().unwrap();

        let path = save_report(&results, &ip, "REPORT BODY", fixed_time()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "REPORT BODY");
        assert!(path.starts_with(&results));
    }

    #[test]
    fn test_same_second_saves_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let ip: IpAddr = "1.1.1.1".parse().unwrap();

        let first = save_report(dir.path(), &ip, "first", fixed_time()).unwrap();
        let second = save_report(dir.path(), &ip, "second", fixed_time()).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second");
        assert!(second.to_string_lossy().ends_with("_1.txt"));
    }

    #[test]
    fn test_unwritable_dir_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the results directory should be
        let blocker = dir.path().join("results");
        fs::write(&blocker, "not a directory").unwrap();
        let ip: IpAddr = "1.1.1.1".parse().unwrap();

        assert!(save_report(&blocker, &ip, "x", fixed_time()).is_none());
    }
}
