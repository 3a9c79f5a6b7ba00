// Plain-text analysis report.
//
// The layout is fixed: header, owner (always), threat (if known), device
// (if known), location history (if any, newest five). Within a rendered
// section a missing value is always shown as a placeholder, never dropped.

use chrono::{DateTime, Local};

use crate::pipeline::analyze::AnalysisResult;
use crate::providers::models::{DeviceInfo, OwnerInfo, ThreatInfo, NOT_AVAILABLE};
use crate::validate::ip_version;

/// How many history entries the report shows.
pub const HISTORY_LIMIT: usize = 5;

const RULE_WIDTH: usize = 60;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an analysis as the plain-text report.
///
/// Pure apart from `analyzed_at`, which the caller supplies.
pub fn format_report(result: &AnalysisResult, analyzed_at: DateTime<Local>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        format!("IP ADDRESS ANALYSIS REPORT: {}", result.ip),
        rule,
        String::new(),
        "BASIC INFORMATION:".to_string(),
        format!("Analysis Time: {}", analyzed_at.format(TIME_FORMAT)),
        format!("IP Version: {}", ip_version(&result.ip)),
        String::new(),
    ];

    lines.extend(owner_section(result.owner.as_ref()));

    if let Some(threat) = &result.threat {
        lines.push(String::new());
        lines.extend(threat_section(threat));
    }

    if let Some(device) = &result.device {
        lines.push(String::new());
        lines.extend(device_section(device));
    }

    if !result.location_history.is_empty() {
        lines.push(String::new());
        lines.push("LOCATION HISTORY:".to_string());
        for record in result.location_history.iter().take(HISTORY_LIMIT) {
            lines.push(format!(
                "{} - {}, {} ({}, {})",
                record.timestamp.with_timezone(&Local).format(TIME_FORMAT),
                record.city,
                record.country,
                record.latitude,
                record.longitude,
            ));
        }
    }

    lines.join("\n")
}

/// Status label for a threat section.
pub fn threat_status(threat: &ThreatInfo) -> &'static str {
    if threat.is_malicious {
        "SUSPICIOUS"
    } else {
        "SAFE"
    }
}

fn owner_section(owner: Option<&OwnerInfo>) -> Vec<String> {
    let unavailable = OwnerInfo::default();
    let owner = owner.unwrap_or(&unavailable);
    vec![
        "OWNER INFORMATION:".to_string(),
        format!("Organization: {}", or_placeholder(Some(&owner.organization), NOT_AVAILABLE)),
        format!("Name: {}", or_placeholder(owner.name.as_ref(), NOT_AVAILABLE)),
        format!("Email: {}", or_placeholder(owner.email.as_ref(), NOT_AVAILABLE)),
        format!("Telephone: {}", or_placeholder(owner.phone.as_ref(), NOT_AVAILABLE)),
        format!("Address: {}", or_placeholder(owner.address.as_ref(), NOT_AVAILABLE)),
        format!("Created Date: {}", or_placeholder(owner.created_date.as_ref(), NOT_AVAILABLE)),
        format!("Last Updated: {}", or_placeholder(owner.updated_date.as_ref(), NOT_AVAILABLE)),
    ]
}

fn threat_section(threat: &ThreatInfo) -> Vec<String> {
    vec![
        "THREAT ANALYSIS:".to_string(),
        format!("Status: {}", threat_status(threat)),
        format!("Trust Score: {}%", threat.confidence_score),
        format!("Number of Reports: {}", threat.recent_reports),
        format!("Category: {}", join_or(&threat.categories, "None")),
        format!("Last Reported: {}", or_placeholder(threat.last_reported.as_ref(), "Never")),
    ]
}

fn device_section(device: &DeviceInfo) -> Vec<String> {
    let ports: Vec<String> = device.ports.iter().map(u16::to_string).collect();
    vec![
        "DEVICE INFORMATION:".to_string(),
        format!("Hostname: {}", or_placeholder(device.hostname.as_ref(), NOT_AVAILABLE)),
        format!("Open Ports: {}", join_or(&ports, "None")),
        format!("Services: {}", join_or(&device.services, "Not detected")),
        format!("Operating System: {}", or_placeholder(device.os.as_ref(), "Not detected")),
        format!("Vulnerabilities: {}", join_or(&device.vulns, "Not found")),
    ]
}

/// Blank strings count as missing.
fn or_placeholder<'a>(value: Option<&'a String>, placeholder: &'a str) -> &'a str {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
}

fn join_or(items: &[String], placeholder: &str) -> String {
    if items.is_empty() {
        placeholder.to_string()
    } else {
        items.join(", ")
    }
}
