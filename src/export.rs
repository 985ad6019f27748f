use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::{HostRecord, SweepResults};

/// Column order of the record file.
pub const CSV_HEADER: [&str; 4] = ["IP", "Hostname", "OS Type", "Subnet Name"];

/// Write host records as CSV (`IP,Hostname,OS Type,Subnet Name`) to any writer.
///
/// The header row is written even when there are no records.
pub fn write_hosts_csv<W: Write>(writer: W, hosts: &[HostRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for host in hosts {
        wtr.serialize(host)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_hosts_csv_path(path: &Path, hosts: &[HostRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_hosts_csv(file, hosts).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_results_json(path: &Path, results: &SweepResults) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
