use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::types::{Credentials, SwitchEndpoint};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        endpoint: SwitchEndpoint,
        reason: String,
    },

    #[error("command `{command}` failed on {endpoint}: {reason}")]
    Command {
        endpoint: SwitchEndpoint,
        command: String,
        reason: String,
    },

    #[error("timed out talking to {0}")]
    Timeout(SwitchEndpoint),
}

/// An open, read-only text session on one switch.
#[async_trait]
pub trait SwitchSession: Send {
    /// Run one command and return its full text output.
    async fn send_command(&mut self, command: &str) -> Result<String, SessionError>;

    /// Release the session. Called exactly once, on every exit path.
    async fn disconnect(&mut self);
}

/// Opens sessions against switches.
#[async_trait]
pub trait SwitchConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &SwitchEndpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn SwitchSession>, SessionError>;
}

/// Runs each query through the system `ssh` client behind a password wrapper
/// (`sshpass -e` by default), which reads the password from `SSHPASS`.
#[derive(Debug, Clone)]
pub struct SshConnector {
    wrapper: String,
}

impl SshConnector {
    pub fn new(wrapper: impl Into<String>) -> Self {
        Self {
            wrapper: wrapper.into(),
        }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new("sshpass")
    }
}

#[async_trait]
impl SwitchConnector for SshConnector {
    async fn connect(
        &self,
        endpoint: &SwitchEndpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn SwitchSession>, SessionError> {
        if endpoint.host().trim().is_empty() {
            return Err(SessionError::Connect {
                endpoint: endpoint.clone(),
                reason: "empty host".into(),
            });
        }
        Ok(Box::new(SshSession {
            wrapper: self.wrapper.clone(),
            endpoint: endpoint.clone(),
            credentials: credentials.clone(),
        }))
    }
}

struct SshSession {
    wrapper: String,
    endpoint: SwitchEndpoint,
    credentials: Credentials,
}

#[async_trait]
impl SwitchSession for SshSession {
    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        let target = format!("{}@{}", self.credentials.username, self.endpoint.host());
        debug!(switch = %self.endpoint, command, "running switch command over ssh");
        // kill_on_drop: a timed-out query must not leave ssh running.
        let output = Command::new(&self.wrapper)
            .arg("-e")
            .arg("ssh")
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .args(["-o", "NumberOfPasswordPrompts=1"])
            .arg(&target)
            .arg(command)
            .env("SSHPASS", &self.credentials.password)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SessionError::Connect {
                endpoint: self.endpoint.clone(),
                reason: format!("could not start {}: {e}", self.wrapper),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::Command {
                endpoint: self.endpoint.clone(),
                command: command.to_string(),
                reason: format!("{} ({})", stderr.trim(), output.status),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn disconnect(&mut self) {
        // One process per command; nothing stays open between calls.
        debug!(switch = %self.endpoint, "ssh session released");
    }
}
