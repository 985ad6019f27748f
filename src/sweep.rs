use std::process::Stdio;
use std::time::Duration;

use ::time::{format_description::well_known, OffsetDateTime};
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ScanConfig, SubnetLabels};
use crate::report::{self, OsLineSearch};
use crate::types::SweepResults;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scan of {0} timed out")]
    Timeout(String),
}

/// Produces the raw text report for one subnet.
#[async_trait]
pub trait ScanRunner: Send + Sync {
    async fn scan(&self, subnet: &str) -> Result<String, ScanError>;
}

/// Runs `nmap` (OS detection and reverse DNS by default) and captures stdout.
#[derive(Debug, Clone)]
pub struct NmapRunner {
    program: String,
    args: Vec<String>,
}

impl NmapRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(cfg: &ScanConfig) -> Self {
        Self::new(cfg.program.clone(), cfg.args.clone())
    }
}

#[async_trait]
impl ScanRunner for NmapRunner {
    async fn scan(&self, subnet: &str) -> Result<String, ScanError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(subnet)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ScanError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            // nmap exits non-zero on partial failures (e.g. OS detection without root)
            // while still printing usable host blocks.
            warn!(
                subnet,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "scanner exited with failure status"
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Options for one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    pub timeout: Option<Duration>,
    pub os_search: OsLineSearch,
}

impl SweepOptions {
    pub fn from_config(cfg: &ScanConfig) -> Self {
        Self {
            timeout: cfg.timeout(),
            os_search: if cfg.legacy_os_search {
                OsLineSearch::ToEndOfText
            } else {
                OsLineSearch::ToNextHeader
            },
        }
    }
}

/// Progress reported while a sweep runs, in subnet order.
#[derive(Debug)]
pub enum SweepEvent<'a> {
    Started(&'a str),
    Failed { subnet: &'a str, error: &'a ScanError },
}

/// Scan subnets one after another and parse each report.
///
/// A subnet whose scan fails is logged, recorded in `failed_subnets` and
/// skipped. Cancelling `cancel` stops before the next subnet and returns what
/// was collected so far.
pub async fn sweep_subnets<R>(
    runner: &R,
    subnets: &[String],
    labels: &SubnetLabels,
    opts: &SweepOptions,
    cancel: CancellationToken,
) -> SweepResults
where
    R: ScanRunner + ?Sized,
{
    sweep_subnets_with(runner, subnets, labels, opts, cancel, |_| {}).await
}

/// Like [`sweep_subnets`], calling `on_event` as each subnet starts or fails.
pub async fn sweep_subnets_with<R, F>(
    runner: &R,
    subnets: &[String],
    labels: &SubnetLabels,
    opts: &SweepOptions,
    cancel: CancellationToken,
    mut on_event: F,
) -> SweepResults
where
    R: ScanRunner + ?Sized,
    F: FnMut(SweepEvent<'_>),
{
    let mut results = SweepResults {
        subnets_total: subnets.len() as u64,
        ..SweepResults::default()
    };

    for subnet in subnets {
        if cancel.is_cancelled() {
            warn!(subnet = %subnet, "sweep cancelled before subnet");
            break;
        }
        info!(subnet = %subnet, "scanning subnet");
        on_event(SweepEvent::Started(subnet));
        let raw = tokio::select! {
            _ = cancel.cancelled() => {
                warn!(subnet = %subnet, "sweep cancelled during scan");
                break;
            }
            res = scan_one(runner, subnet, opts.timeout) => res,
        };
        match raw {
            Ok(text) => {
                let hosts = report::parse_scan_report_with(&text, subnet, labels, opts.os_search);
                info!(subnet = %subnet, hosts = hosts.len(), "subnet scanned");
                results.hosts.extend(hosts);
                results.subnets_scanned += 1;
            }
            Err(e) => {
                warn!(subnet = %subnet, error = %e, "error scanning subnet, skipping");
                on_event(SweepEvent::Failed {
                    subnet,
                    error: &e,
                });
                results.failed_subnets.push(subnet.clone());
            }
        }
    }

    results.finished_at = now_iso_like();
    results
}

async fn scan_one<R>(runner: &R, subnet: &str, timeout: Option<Duration>) -> Result<String, ScanError>
where
    R: ScanRunner + ?Sized,
{
    match timeout {
        Some(limit) => time::timeout(limit, runner.scan(subnet))
            .await
            .map_err(|_| ScanError::Timeout(subnet.to_string()))?,
        None => runner.scan(subnet).await,
    }
}

fn now_iso_like() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
