use std::net::Ipv4Addr;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::SubnetLabels;
use crate::types::{HostRecord, OsFamily, UNKNOWN};

/// How far past a host header the parser looks for that host's OS line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OsLineSearch {
    /// Stop at the next host header, so a host without an OS line stays `Other`.
    #[default]
    ToNextHeader,
    /// Search to the end of the report. A host without its own OS line picks up
    /// the next host's line; kept for output compatibility with older reports.
    ToEndOfText,
}

fn host_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Nmap scan report for (.+) \(([\d.]+)\)|Nmap scan report for ([\d.]+)")
            .expect("host header pattern is valid")
    })
}

fn os_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"OS details: .+|Aggressive OS guesses: .+").expect("OS line pattern is valid")
    })
}

/// Parse one scan report into host records, bounding each OS search to its own block.
///
/// Never fails: text without host headers yields an empty vector.
pub fn parse_scan_report(raw: &str, subnet: &str, labels: &SubnetLabels) -> Vec<HostRecord> {
    parse_scan_report_with(raw, subnet, labels, OsLineSearch::default())
}

/// Parse one scan report with an explicit OS-line search mode.
pub fn parse_scan_report_with(
    raw: &str,
    subnet: &str,
    labels: &SubnetLabels,
    search: OsLineSearch,
) -> Vec<HostRecord> {
    let subnet_label = labels.label_for(subnet);
    let headers: Vec<_> = host_pattern().captures_iter(raw).collect();
    let mut out = Vec::with_capacity(headers.len());

    for (idx, caps) in headers.iter().enumerate() {
        // Group 0 always exists on a match.
        let whole = caps.get(0).expect("match has group 0");
        let (name, addr) = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(name), Some(addr), _) => (name.as_str(), addr.as_str()),
            (_, _, Some(addr)) => (UNKNOWN, addr.as_str()),
            _ => continue,
        };
        let address: Ipv4Addr = match addr.parse() {
            Ok(a) => a,
            Err(_) => {
                debug!(header = whole.as_str(), "skipping host header with invalid IPv4 address");
                continue;
            }
        };

        let end = match search {
            OsLineSearch::ToNextHeader => headers
                .get(idx + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(raw.len()),
            OsLineSearch::ToEndOfText => raw.len(),
        };
        let os_line = find_os_line(raw, whole.end()..end).unwrap_or(UNKNOWN);
        let os_family = OsFamily::classify(os_line);
        debug!(%address, name, os_line, %os_family, "parsed host block");

        out.push(HostRecord {
            address,
            display_name: name.to_string(),
            os_family,
            subnet_label: subnet_label.to_string(),
        });
    }

    out
}

fn find_os_line(raw: &str, span: Range<usize>) -> Option<&str> {
    os_pattern().find(&raw[span]).map(|m| m.as_str())
}
