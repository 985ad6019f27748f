use anyhow::Result;
use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Detect local IPv4 addresses and return their /24 networks, see [`subnets_for`].
pub fn detect_local_subnets() -> Result<Vec<String>> {
    let addrs = get_if_addrs()?.into_iter().filter_map(|iface| match iface.addr {
        IfAddr::V4(v4) => Some(v4.ip),
        IfAddr::V6(_) => None,
    });
    Ok(subnets_for(addrs))
}

/// Map addresses to the /24 networks containing them, spelled the way the
/// subnets file and the label table spell CIDRs (`192.168.1.0/24`).
///
/// Loopback and link-local addresses are skipped; the result is sorted and
/// free of duplicates.
pub fn subnets_for<I>(addrs: I) -> Vec<String>
where
    I: IntoIterator<Item = Ipv4Addr>,
{
    addrs
        .into_iter()
        .filter(|ip| !ip.is_loopback() && !ip.is_link_local())
        .filter_map(|ip| Ipv4Net::new(ip, 24).ok().map(|n| n.trunc()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}
