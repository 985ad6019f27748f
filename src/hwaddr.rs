use std::net::IpAddr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HwAddrError {
    #[error("malformed hardware address {0:?}: expected 12 hex digits")]
    Malformed(String),
}

/// Normalize a MAC address to the dotted form switches print in their
/// forwarding tables, e.g. `00-11-22-AA-BB-CC` → `0011.22aa.bbcc`.
///
/// `-`, `:` and `.` separators are accepted; anything else, or a digit count
/// other than 12, is rejected.
pub fn to_cisco_dotted(raw: &str) -> Result<String, HwAddrError> {
    let hex: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | ':' | '.'))
        .collect::<String>()
        .to_ascii_lowercase();
    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HwAddrError::Malformed(raw.to_string()));
    }
    Ok(format!("{}.{}.{}", &hex[..4], &hex[4..8], &hex[8..]))
}

/// Turn a lookup target into an IP. Literal addresses are used as-is, anything
/// else goes through the system resolver and the first IPv4 answer wins.
pub async fn resolve_target(identifier: &str) -> Option<IpAddr> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }
    if let Ok(ip) = identifier.parse::<IpAddr>() {
        return Some(ip);
    }
    match tokio::net::lookup_host((identifier, 0)).await {
        Ok(addrs) => {
            let addrs: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
            debug!(identifier, ?addrs, "resolved target");
            addrs
                .iter()
                .copied()
                .find(IpAddr::is_ipv4)
                .or_else(|| addrs.first().copied())
        }
        Err(e) => {
            debug!(identifier, error = %e, "target resolution failed");
            None
        }
    }
}

/// Looks up the hardware address currently bound to an IP.
#[async_trait]
pub trait HwAddrResolver: Send + Sync {
    /// `Ok(None)` when the source has no entry for `ip`.
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>>;
}

/// Reads the client id of a Windows DHCP server lease through PowerShell.
#[derive(Debug, Clone)]
pub struct DhcpLeaseResolver {
    server: String,
    program: String,
}

impl DhcpLeaseResolver {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            program: "powershell".into(),
        }
    }

    /// Override the PowerShell executable (e.g. `pwsh`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn script(&self, ip: IpAddr) -> String {
        format!(
            "Get-DhcpServerv4Lease -ComputerName {} -IPAddress {} | Select-Object -ExpandProperty ClientId",
            self.server, ip
        )
    }
}

#[async_trait]
impl HwAddrResolver for DhcpLeaseResolver {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .arg("-Command")
            .arg(self.script(ip))
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {} for DHCP lease lookup", self.program))?;
        let client_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if client_id.is_empty() {
            debug!(%ip, server = %self.server, "no DHCP lease found");
            return Ok(None);
        }
        Ok(Some(client_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashed_upper_case_client_id() {
        assert_eq!(to_cisco_dotted("00-11-22-AA-BB-CC").unwrap(), "0011.22aa.bbcc");
    }

    #[test]
    fn other_separators() {
        assert_eq!(to_cisco_dotted("00:11:22:aa:bb:cc").unwrap(), "0011.22aa.bbcc");
        assert_eq!(to_cisco_dotted("0011.22aa.bbcc").unwrap(), "0011.22aa.bbcc");
        assert_eq!(to_cisco_dotted("001122AABBCC\r\n").unwrap(), "0011.22aa.bbcc");
    }

    #[test]
    fn malformed_is_rejected() {
        assert!(to_cisco_dotted("00-11-22").is_err());
        assert!(to_cisco_dotted("00-11-22-aa-bb-cc-dd").is_err());
        assert!(to_cisco_dotted("zz-11-22-aa-bb-cc").is_err());
        assert_eq!(
            to_cisco_dotted(""),
            Err(HwAddrError::Malformed(String::new()))
        );
    }

    #[test]
    fn lease_script_names_server_and_ip() {
        let r = DhcpLeaseResolver::new("192.168.2.53");
        let s = r.script("192.168.1.5".parse().unwrap());
        assert!(s.contains("-ComputerName 192.168.2.53"));
        assert!(s.contains("-IPAddress 192.168.1.5"));
    }

    #[tokio::test]
    async fn configured_program_runs_the_lease_query() {
        let r = DhcpLeaseResolver::new("192.168.2.53").with_program("lan-trace-no-such-pwsh");
        let err = r.lookup("192.168.1.5".parse().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("lan-trace-no-such-pwsh"));
    }

    #[tokio::test]
    async fn literal_ip_is_not_looked_up() {
        assert_eq!(
            resolve_target(" 10.1.2.3 ").await,
            Some("10.1.2.3".parse().unwrap())
        );
        assert_eq!(resolve_target("").await, None);
    }
}
