use std::time::Duration;

use thiserror::Error;
use tokio::time;
use tracing::{info, warn};

use crate::forwarding;
use crate::hwaddr::{self, HwAddrError, HwAddrResolver};
use crate::session::{SessionError, SwitchConnector, SwitchSession};
use crate::types::{Credentials, LookupResult, SwitchEndpoint};

/// Query that dumps a switch's forwarding table.
pub const DEFAULT_TABLE_COMMAND: &str = "show mac address-table";

/// Failures that stop a lookup before any switch is contacted.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("could not resolve {0} to an IP address")]
    Unresolved(String),

    #[error("no hardware address known for {0}")]
    NoHardwareAddress(String),

    #[error(transparent)]
    HwAddr(#[from] HwAddrError),

    #[error("hardware address lookup failed: {0:#}")]
    Lookup(anyhow::Error),

    #[error("no switches to search")]
    NoSwitches,
}

/// Searches switches one at a time and stops at the first forwarding-table hit.
pub struct Locator<C> {
    connector: C,
    command: String,
    timeout: Duration,
}

impl<C: SwitchConnector> Locator<C> {
    pub fn new(connector: C, timeout: Duration) -> Self {
        Self {
            connector,
            command: DEFAULT_TABLE_COMMAND.to_string(),
            timeout,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Search `switches` in order for `hw_address`.
    ///
    /// An unreachable switch, failed query, or timeout counts as a miss and
    /// the search moves on. `NotFound` is returned only after every switch has
    /// been tried.
    pub async fn locate(
        &self,
        hw_address: &str,
        switches: &[SwitchEndpoint],
        credentials: &Credentials,
    ) -> Result<LookupResult, LocateError> {
        if switches.is_empty() {
            return Err(LocateError::NoSwitches);
        }
        for switch in switches {
            info!(switch = %switch, "connecting to switch");
            match self.search_switch(switch, hw_address, credentials).await {
                Ok(Some(port)) => {
                    info!(switch = %switch, port = %port, hw_address, "hardware address found");
                    return Ok(LookupResult::Found {
                        switch_address: switch.clone(),
                        port,
                    });
                }
                Ok(None) => {
                    info!(switch = %switch, hw_address, "hardware address not in forwarding table");
                }
                Err(e) => {
                    warn!(switch = %switch, error = %e, "skipping switch");
                }
            }
        }
        Ok(LookupResult::NotFound)
    }

    async fn search_switch(
        &self,
        switch: &SwitchEndpoint,
        hw_address: &str,
        credentials: &Credentials,
    ) -> Result<Option<String>, SessionError> {
        // One budget covers connect and query together.
        let deadline = time::Instant::now() + self.timeout;
        let mut session =
            time::timeout_at(deadline, self.connector.connect(switch, credentials))
                .await
                .map_err(|_| SessionError::Timeout(switch.clone()))??;

        let table = self.query(&mut *session, switch, deadline).await;
        session.disconnect().await;

        Ok(forwarding::find_entry(&table?, hw_address).map(|e| e.port))
    }

    async fn query(
        &self,
        session: &mut dyn SwitchSession,
        switch: &SwitchEndpoint,
        deadline: time::Instant,
    ) -> Result<String, SessionError> {
        time::timeout_at(deadline, session.send_command(&self.command))
            .await
            .map_err(|_| SessionError::Timeout(switch.clone()))?
    }
}

/// Resolve `target` (IP or hostname) to its hardware address, then locate it.
///
/// Resolution failures are returned as errors and no switch is contacted.
pub async fn find_device<C, R>(
    target: &str,
    resolver: &R,
    locator: &Locator<C>,
    switches: &[SwitchEndpoint],
    credentials: &Credentials,
) -> Result<LookupResult, LocateError>
where
    C: SwitchConnector,
    R: HwAddrResolver + ?Sized,
{
    let ip = hwaddr::resolve_target(target)
        .await
        .ok_or_else(|| LocateError::Unresolved(target.to_string()))?;
    let raw = resolver
        .lookup(ip)
        .await
        .map_err(LocateError::Lookup)?
        .ok_or_else(|| LocateError::NoHardwareAddress(target.to_string()))?;
    let hw_address = hwaddr::to_cisco_dotted(&raw)?;
    info!(target, %ip, hw_address = %hw_address, "resolved hardware address");
    locator.locate(&hw_address, switches, credentials).await
}
