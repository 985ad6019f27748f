use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::types::{SwitchEndpoint, UNKNOWN};

/// Environment variable consulted when no config path is given.
pub const CONFIG_ENV: &str = "LAN_TRACE_CONFIG";

/// Static CIDR → human label mapping. Lookups are exact string matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SubnetLabels(BTreeMap<String, String>);

impl SubnetLabels {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Label for `cidr`, or `"Unknown"` when the CIDR is not configured.
    pub fn label_for(&self, cidr: &str) -> &str {
        self.0.get(cidr).map(String::as_str).unwrap_or(UNKNOWN)
    }
}

impl Default for SubnetLabels {
    fn default() -> Self {
        Self::new([
            ("192.168.1.0/24", "Secure Lan"),
            ("192.168.2.0/24", "Server/Infra"),
            ("192.168.3.0/24", "IoT"),
        ])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub subnets: SubnetsConfig,
    pub scan: ScanConfig,
    pub locate: LocateConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubnetsConfig {
    pub labels: SubnetLabels,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scanner executable.
    pub program: String,
    /// Arguments placed before the subnet.
    pub args: Vec<String>,
    /// Per-subnet limit in seconds; 0 means no limit.
    pub timeout_secs: u64,
    /// Search for the OS line to the end of the report instead of the next host block.
    pub legacy_os_search: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            program: "nmap".into(),
            args: vec!["-O".into(), "-R".into()],
            timeout_secs: 0,
            legacy_os_search: false,
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    /// Switches in search priority order.
    pub switches: Vec<SwitchEndpoint>,
    /// Forwarding-table query sent to every switch.
    pub command: String,
    /// Connect + query limit per switch, in seconds.
    pub timeout_secs: u64,
    /// DHCP server holding the leases used for IP → MAC lookup.
    pub dhcp_server: String,
    /// PowerShell executable that runs the lease query (`pwsh` off Windows).
    pub powershell_program: String,
    /// Wrapper used to feed the password to ssh.
    pub ssh_program: String,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            switches: ["192.168.2.2", "192.168.2.3", "192.168.2.4"]
                .into_iter()
                .map(SwitchEndpoint::new)
                .collect(),
            command: "show mac address-table".into(),
            timeout_secs: 15,
            dhcp_server: "192.168.2.53".into(),
            powershell_program: "powershell".into(),
            ssh_program: "sshpass".into(),
        }
    }
}

impl LocateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load from `path`, else from `$LAN_TRACE_CONFIG`, else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV);
        let path = path.or(env_path.as_deref().map(Path::new));
        match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file: {}", p.display()))?;
                Self::load_from_str(&s)
                    .with_context(|| format!("invalid config file: {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.scan.program.trim().is_empty(), "scan.program must be non-empty");
        ensure!(
            !self.locate.switches.is_empty(),
            "locate.switches must list at least one switch"
        );
        ensure!(
            self.locate.switches.iter().all(|s| !s.host().trim().is_empty()),
            "locate.switches must not contain empty entries"
        );
        ensure!(!self.locate.command.trim().is_empty(), "locate.command must be non-empty");
        ensure!(
            !self.locate.powershell_program.trim().is_empty(),
            "locate.powershell_program must be non-empty"
        );
        ensure!(
            self.locate.timeout_secs > 0,
            "locate.timeout_secs must be > 0, got {}",
            self.locate.timeout_secs
        );
        Ok(())
    }
}
