//! Library crate for lan-trace-rs: nmap report parsing with OS classification,
//! and switch-port location of a host by its hardware address.
pub mod config;
pub mod export;
pub mod forwarding;
pub mod hwaddr;
pub mod locate;
pub mod netdetect;
pub mod report;
pub mod session;
pub mod subnets;
pub mod sweep;
pub mod types;
