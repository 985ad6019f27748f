use std::net::Ipv4Addr;

use lan_trace_rs::config::SubnetLabels;
use lan_trace_rs::report::{parse_scan_report, parse_scan_report_with, OsLineSearch};
use lan_trace_rs::types::{HostRecord, OsFamily};

const SWEEP_OUTPUT: &str = "\
Starting Nmap 7.94SVN ( https://nmap.org ) at 2024-10-07 09:12 CDT
Nmap scan report for gw.lab (192.168.2.1)
Host is up (0.00041s latency).
Not shown: 997 closed tcp ports (reset)
PORT    STATE SERVICE
22/tcp  open  ssh
MAC Address: 00:1B:54:AA:01:02 (Cisco Systems)
Device type: switch
Running: Cisco IOS 15.X
OS details: Cisco Catalyst 2960 switch (IOS 15.0)
Network Distance: 1 hop

Nmap scan report for esx01.lab (192.168.2.10)
Host is up (0.00062s latency).
OS details: VMware ESXi 6.5.0 - 7.0.3 (Linux 2.6.X kernel)

Nmap scan report for 192.168.2.44
Host is up (0.0011s latency).
Aggressive OS guesses: Microsoft Windows 10 1709 - 21H2 (97%), Microsoft Windows Server 2016 (93%)
No exact OS matches for host (test conditions non-ideal).

OS detection performed. Please report any incorrect results at https://nmap.org/submit/ .
Nmap done: 256 IP addresses (3 hosts up) scanned in 14.20 seconds
";

#[test]
fn named_linux_host_in_secure_lan() {
    let raw = "Nmap scan report for host1 (192.168.1.5)\n...\nOS details: Linux 5.x\n";
    let hosts = parse_scan_report(raw, "192.168.1.0/24", &SubnetLabels::default());
    assert_eq!(
        hosts,
        vec![HostRecord {
            address: Ipv4Addr::new(192, 168, 1, 5),
            display_name: "host1".into(),
            os_family: OsFamily::Linux,
            subnet_label: "Secure Lan".into(),
        }]
    );
}

#[test]
fn full_report_in_block_order() {
    let hosts = parse_scan_report(SWEEP_OUTPUT, "192.168.2.0/24", &SubnetLabels::default());
    let summary: Vec<_> = hosts
        .iter()
        .map(|h| (h.address.to_string(), h.display_name.as_str(), h.os_family))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("192.168.2.1".to_string(), "gw.lab", OsFamily::Cisco),
            ("192.168.2.10".to_string(), "esx01.lab", OsFamily::ESXi),
            ("192.168.2.44".to_string(), "Unknown", OsFamily::Windows),
        ]
    );
    assert!(hosts.iter().all(|h| h.subnet_label == "Server/Infra"));
}

#[test]
fn unknown_cidr_labels_every_record_unknown() {
    let hosts = parse_scan_report(SWEEP_OUTPUT, "172.16.0.0/16", &SubnetLabels::default());
    assert_eq!(hosts.len(), 3);
    assert!(hosts.iter().all(|h| h.subnet_label == "Unknown"));
}

#[test]
fn custom_labels_are_used_verbatim() {
    let labels = SubnetLabels::new([("192.168.2.0/24", "DC East / Rack 4")]);
    let hosts = parse_scan_report(SWEEP_OUTPUT, "192.168.2.0/24", &labels);
    assert!(hosts.iter().all(|h| h.subnet_label == "DC East / Rack 4"));
}

#[test]
fn text_without_headers_is_empty() {
    let labels = SubnetLabels::default();
    for raw in ["", "\n\n", "Nmap done: 256 IP addresses (0 hosts up)", "OS details: Linux 5.x"] {
        assert!(parse_scan_report(raw, "192.168.1.0/24", &labels).is_empty());
    }
}

const TWO_BLOCKS: &str = "\
Nmap scan report for printer.lab (192.168.3.7)
Host is up.
Too many fingerprints match this host to give specific OS details

Nmap scan report for nas.lab (192.168.3.8)
Host is up.
OS details: Linux 4.15 - 5.8
";

#[test]
fn os_search_stops_at_next_header() {
    let hosts = parse_scan_report(TWO_BLOCKS, "192.168.3.0/24", &SubnetLabels::default());
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].display_name, "printer.lab");
    assert_eq!(hosts[0].os_family, OsFamily::Other);
    assert_eq!(hosts[1].os_family, OsFamily::Linux);
}

#[test]
fn legacy_os_search_leaks_into_next_block() {
    let hosts = parse_scan_report_with(
        TWO_BLOCKS,
        "192.168.3.0/24",
        &SubnetLabels::default(),
        OsLineSearch::ToEndOfText,
    );
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].os_family, OsFamily::Linux);
    assert_eq!(hosts[1].os_family, OsFamily::Linux);
}

#[test]
fn last_block_without_os_line_is_other_in_both_modes() {
    let raw = "Nmap scan report for 10.0.0.9\nHost is up.\n";
    for mode in [OsLineSearch::ToNextHeader, OsLineSearch::ToEndOfText] {
        let hosts = parse_scan_report_with(raw, "10.0.0.0/24", &SubnetLabels::default(), mode);
        assert_eq!(hosts[0].os_family, OsFamily::Other);
    }
}

#[test]
fn classification_priority_holds_for_mixed_descriptions() {
    let cases = [
        ("Cisco Windows Linux ESXi", OsFamily::ESXi),
        ("Cisco Windows Linux", OsFamily::Linux),
        ("Cisco Windows", OsFamily::Windows),
        ("Cisco", OsFamily::Cisco),
        ("Apple macOS 13", OsFamily::Other),
    ];
    for (desc, want) in cases {
        let raw = format!("Nmap scan report for 10.0.0.1\nOS details: {desc}\n");
        let hosts = parse_scan_report(&raw, "10.0.0.0/24", &SubnetLabels::default());
        assert_eq!(hosts[0].os_family, want, "description {desc:?}");
    }
}
