use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Placeholder used for absent host names, OS descriptions and subnet labels.
pub const UNKNOWN: &str = "Unknown";

/// Coarse operating-system bucket assigned to a discovered host.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    ESXi,
    Linux,
    Windows,
    Cisco,
    Other,
}

impl OsFamily {
    /// Keywords checked in order; the first one contained in the description wins.
    const RULES: [(&'static str, OsFamily); 4] = [
        ("ESXi", OsFamily::ESXi),
        ("Linux", OsFamily::Linux),
        ("Windows", OsFamily::Windows),
        ("Cisco", OsFamily::Cisco),
    ];

    /// Classify a raw OS description. Case-sensitive substring match, never fails.
    pub fn classify(description: &str) -> OsFamily {
        Self::RULES
            .iter()
            .find(|(keyword, _)| description.contains(keyword))
            .map(|(_, family)| *family)
            .unwrap_or(OsFamily::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::ESXi => "ESXi",
            OsFamily::Linux => "Linux",
            OsFamily::Windows => "Windows",
            OsFamily::Cisco => "Cisco",
            OsFamily::Other => "Other",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered host from a single scan pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    #[serde(rename = "IP")]
    pub address: Ipv4Addr,
    #[serde(rename = "Hostname")]
    pub display_name: String,
    #[serde(rename = "OS Type")]
    pub os_family: OsFamily,
    #[serde(rename = "Subnet Name")]
    pub subnet_label: String,
}

/// Aggregate output of a sweep over several subnets.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SweepResults {
    pub subnets_total: u64,
    pub subnets_scanned: u64,
    pub failed_subnets: Vec<String>,
    pub hosts: Vec<HostRecord>,
    pub finished_at: String,
}

/// One forwarding-table line that mentions the wanted hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingEntry {
    pub hw_address: String,
    pub port: String,
}

/// A managed switch to search, as an IP address or resolvable name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SwitchEndpoint(pub String);

impl SwitchEndpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    pub fn host(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SwitchEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Login shared by every switch in a lookup.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of a switch-port lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Found {
        switch_address: SwitchEndpoint,
        port: String,
    },
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_priority_order() {
        assert_eq!(OsFamily::classify("VMware ESXi 7.0 (Linux based)"), OsFamily::ESXi);
        assert_eq!(OsFamily::classify("Linux 4.x, Microsoft Windows 10"), OsFamily::Linux);
        assert_eq!(OsFamily::classify("Microsoft Windows Server, Cisco IOS"), OsFamily::Windows);
        assert_eq!(OsFamily::classify("Cisco IOS 15.2"), OsFamily::Cisco);
        assert_eq!(OsFamily::classify("FreeBSD 13.1"), OsFamily::Other);
        assert_eq!(OsFamily::classify(UNKNOWN), OsFamily::Other);
    }

    #[test]
    fn classify_is_case_sensitive() {
        assert_eq!(OsFamily::classify("linux 5.x"), OsFamily::Other);
        assert_eq!(OsFamily::classify("esxi"), OsFamily::Other);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        let out = format!("{creds:?}");
        assert!(out.contains("admin"));
        assert!(!out.contains("hunter2"));
    }
}
