// Colored terminal output for reports and stored history.
//
// The report text itself is plain; this module only decorates it for
// display. Saved report files never contain color codes.

use colored::Colorize;

use crate::db::models::LocationRecord;

/// Print a rendered report with section headers and threat status colored.
pub fn display_report(report: &str) {
    println!();
    for line in report.lines() {
        println!("{}", colorize_line(line));
    }
}

fn colorize_line(line: &str) -> String {
    if line.starts_with('=') {
        return line.dimmed().to_string();
    }
    if let Some(status) = line.strip_prefix("Status: ") {
        let status = match status {
            "SUSPICIOUS" => status.red().bold(),
            "SAFE" => status.green().bold(),
            other => other.normal(),
        };
        return format!("Status: {status}");
    }
    if is_section_header(line) {
        return line.bold().to_string();
    }
    line.to_string()
}

/// Section headers are upper-case lines ending in a colon.
fn is_section_header(line: &str) -> bool {
    line.ends_with(':') && line.chars().any(|c| c.is_alphabetic()) && !line.chars().any(|c| c.is_lowercase())
}

/// Display the full stored history for an IP.
pub fn display_history(ip: &str, history: &[LocationRecord]) {
    if history.is_empty() {
        println!("No history for that IP.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Location history for {ip} ({} entries) ===", history.len()).bold()
    );
    for record in history {
        println!(
            "  {}  {}, {} {}",
            record
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed(),
            record.city,
            record.country,
            format!("({}, {})", record.latitude, record.longitude).dimmed(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_header_detection() {
        assert!(is_section_header("THREAT ANALYSIS:"));
        assert!(is_section_header("OWNER INFORMATION:"));
        assert!(!is_section_header("Status: SAFE"));
        assert!(!is_section_header("Name: Not available"));
        assert!(!is_section_header(":"));
    }

    #[test]
    fn test_plain_lines_pass_through() {
        colored::control::set_override(false);
        assert_eq!(colorize_line("Trust Score: 75%"), "Trust Score: 75%");
        assert_eq!(colorize_line("Status: SUSPICIOUS"), "Status: SUSPICIOUS");
    }
}
