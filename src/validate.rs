// IP address validation: the gate in front of every network and storage call.

use std::net::IpAddr;

use crate::error::AnalyzeError;

/// True when `ip` is a syntactically valid IPv4 or IPv6 literal.
///
/// Hostnames, ports, CIDR suffixes, zone ids and surrounding whitespace are
/// all rejected.
pub fn validate(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// Parse an IP literal, turning failure into `AnalyzeError::InvalidInput`.
pub fn parse_ip(ip: &str) -> Result<IpAddr, AnalyzeError> {
    ip.parse::<IpAddr>()
        .map_err(|_| AnalyzeError::InvalidInput(ip.to_string()))
}

/// The IP version shown in the report header.
pub fn ip_version(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 4,
        IpAddr::V6(_) => 6,
    }
}
