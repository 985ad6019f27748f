use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use lan_trace_rs::config::AppConfig;
use lan_trace_rs::hwaddr::DhcpLeaseResolver;
use lan_trace_rs::locate::{self, LocateError, Locator};
use lan_trace_rs::report::OsLineSearch;
use lan_trace_rs::session::SshConnector;
use lan_trace_rs::sweep::{self, NmapRunner, SweepEvent, SweepOptions};
use lan_trace_rs::types::{Credentials, LookupResult, SwitchEndpoint};
use lan_trace_rs::{export, netdetect, subnets};

/// Environment variable read for the switch password before prompting.
const PASSWORD_ENV: &str = "LAN_TRACE_PASSWORD";

/// lan-trace — sweep subnets for hosts and OS families, or find the switch port a host is plugged into.
#[derive(Debug, Parser)]
#[command(name = "lan-trace", version, long_about = None)]
struct Cli {
    /// TOML config file (defaults to $LAN_TRACE_CONFIG, then built-in settings).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan each subnet with nmap and write one record per host.
    Sweep {
        /// File with one subnet CIDR per line. If omitted, auto-detect local /24 networks.
        subnets: Option<PathBuf>,

        /// CSV output path.
        #[arg(long, default_value = "scan_results.csv")]
        output: PathBuf,

        /// Also write the full results as pretty JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Let a host without an OS line take the next OS line in the report.
        #[arg(long = "legacy-os-search", default_value_t = false)]
        legacy_os_search: bool,
    },

    /// Find the switch port a host is connected to.
    Locate {
        /// IP address or hostname. Prompted for when omitted.
        target: Option<String>,

        /// SSH username. Prompted for when omitted.
        #[arg(long, short)]
        username: Option<String>,

        /// Switch to search, in order; repeat to replace the configured list.
        #[arg(long = "switch")]
        switches: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Sweep {
            subnets,
            output,
            json,
            legacy_os_search,
        } => run_sweep(&config, subnets, output, json, legacy_os_search).await,
        Command::Locate {
            target,
            username,
            switches,
        } => run_locate(&config, target, username, switches).await,
    }
}

async fn run_sweep(
    config: &AppConfig,
    subnets_file: Option<PathBuf>,
    output: PathBuf,
    json: Option<PathBuf>,
    legacy_os_search: bool,
) -> Result<()> {
    let subnets = match subnets_file {
        Some(path) => subnets::load_subnets_from_path(&path)?,
        None => {
            let detected = netdetect::detect_local_subnets()
                .context("failed to detect local networks")?;
            if detected.is_empty() {
                bail!("no subnets file given and no local IPv4 networks detected");
            }
            detected
        }
    };

    let mut opts = SweepOptions::from_config(&config.scan);
    if legacy_os_search {
        opts.os_search = OsLineSearch::ToEndOfText;
    }
    let runner = NmapRunner::from_config(&config.scan);

    // Ctrl-C stops the sweep; records gathered so far are still written.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    let results = sweep::sweep_subnets_with(
        &runner,
        &subnets,
        &config.subnets.labels,
        &opts,
        cancel,
        |event| match event {
            SweepEvent::Started(subnet) => println!("Scanning subnet: {subnet}"),
            SweepEvent::Failed { subnet, .. } => {
                println!("Error scanning subnet {subnet}, skipped.")
            }
        },
    )
    .await;

    export::write_hosts_csv_path(&output, &results.hosts)?;
    if let Some(path) = json.as_deref() {
        if let Err(e) = export::write_results_json(path, &results) {
            warn!(path = %path.display(), error = %e, "failed to write JSON results");
        }
    }
    println!("Scan complete. Results saved to '{}'.", output.display());
    Ok(())
}

async fn run_locate(
    config: &AppConfig,
    target: Option<String>,
    username: Option<String>,
    switches: Vec<String>,
) -> Result<()> {
    println!();
    let target = match target {
        Some(t) => t,
        None => prompt("Enter the IP address or hostname: ")?,
    };
    let username = match username {
        Some(u) => u,
        None => prompt("Enter your SSH username: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(p) => p,
        Err(_) => rpassword::prompt_password("Enter your SSH password: ")
            .context("failed to read password")?,
    };
    println!();
    let credentials = Credentials::new(username, password);

    let switches: Vec<SwitchEndpoint> = if switches.is_empty() {
        config.locate.switches.clone()
    } else {
        switches.into_iter().map(SwitchEndpoint::new).collect()
    };

    let resolver = DhcpLeaseResolver::new(config.locate.dhcp_server.clone())
        .with_program(config.locate.powershell_program.clone());
    let locator = Locator::new(
        SshConnector::new(config.locate.ssh_program.clone()),
        config.locate.timeout(),
    )
    .with_command(config.locate.command.clone());

    match locate::find_device(&target, &resolver, &locator, &switches, &credentials).await {
        Ok(LookupResult::Found {
            switch_address,
            port,
        }) => {
            println!("The device {target} is connected to port {port} on switch {switch_address}.");
        }
        Ok(LookupResult::NotFound) => {
            println!("The device {target} was not found on any of the specified switches.");
        }
        Err(LocateError::Unresolved(_)) => {
            println!("Failed to resolve {target} to an IP address.");
        }
        Err(LocateError::NoHardwareAddress(_)) => {
            println!("MAC address for {target} not found.");
        }
        Err(e) => {
            println!("Could not look up the MAC address for {target}: {e}");
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
