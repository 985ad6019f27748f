use crate::types::ForwardingEntry;

/// Find the first forwarding-table line mentioning `hw_address`.
///
/// The port is the last whitespace-delimited token of that line. A matching
/// line with no tokens cannot occur since it contains the address itself.
pub fn find_entry(table: &str, hw_address: &str) -> Option<ForwardingEntry> {
    if hw_address.is_empty() {
        return None;
    }
    table
        .lines()
        .filter(|line| line.contains(hw_address))
        .find_map(|line| line.split_whitespace().next_back())
        .map(|port| ForwardingEntry {
            hw_address: hw_address.to_string(),
            port: port.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "          Mac Address Table
-------------------------------------------

Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
 All    0100.0ccc.cccc    STATIC      CPU
  10    0011.2233.4455    DYNAMIC     Gi1/0/7
  20    00aa.bbcc.ddee    DYNAMIC     Gi1/0/12
  20    00aa.bbcc.ddee    DYNAMIC     Po1
Total Mac Addresses for this criterion: 4
";

    #[test]
    fn trailing_token_is_port() {
        let e = find_entry(TABLE, "0011.2233.4455").unwrap();
        assert_eq!(e.port, "Gi1/0/7");
        assert_eq!(e.hw_address, "0011.2233.4455");
    }

    #[test]
    fn first_matching_line_wins() {
        assert_eq!(find_entry(TABLE, "00aa.bbcc.ddee").unwrap().port, "Gi1/0/12");
    }

    #[test]
    fn absent_address() {
        assert!(find_entry(TABLE, "dead.beef.0001").is_none());
        assert!(find_entry("", "0011.2233.4455").is_none());
        assert!(find_entry(TABLE, "").is_none());
    }

    #[test]
    fn crlf_lines() {
        let table = "10 0011.2233.4455 DYNAMIC Gi1/0/3\r\n";
        assert_eq!(find_entry(table, "0011.2233.4455").unwrap().port, "Gi1/0/3");
    }
}
