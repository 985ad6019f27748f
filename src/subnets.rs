use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Parse a subnets file into scan targets, in file order.
///
/// Supported format per line:
/// - one target, normally a CIDR such as `192.168.1.0/24`
/// - comments: everything after `#` is ignored
/// - whitespace and blank lines are ignored
///
/// Entries are kept verbatim so label lookups match the file exactly.
pub fn parse_subnets_str(s: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for (idx, raw_line) in s.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().map(str::trim).unwrap_or("");
        if line.is_empty() {
            continue;
        }
        if line.split_whitespace().count() > 1 {
            bail!("line {line_no}: expected one subnet per line, got: {line}");
        }
        out.push(line.to_string());
    }
    Ok(out)
}

/// Load scan targets from a file. Errors if the file cannot be read or lists nothing.
pub fn load_subnets_from_path(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read subnets file: {}", path.display()))?;
    let subnets = parse_subnets_str(&content)
        .with_context(|| format!("invalid subnets file: {}", path.display()))?;
    if subnets.is_empty() {
        bail!("subnets file lists no subnets: {}", path.display());
    }
    Ok(subnets)
}
