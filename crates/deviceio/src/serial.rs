use regex::RegexBuilder;

/// Extracts the serial number from raw inventory command output for a
/// given `(vendor, model)` pair. Matching is case-insensitive; the result
/// is upper-cased and trimmed. No match yields `""`, which callers treat
/// as a mismatch against the recorded serial (§4.2).
pub fn parse_serial(vendor: &str, model: &str, output: &str) -> String {
    let pattern = match (vendor, model) {
        ("cisco", "n9k") => r#"NAME:\s*"Chassis".*?SN:\s*([A-Z0-9]+)"#,
        ("cisco", "c8k") => {
            if let Some(serial) = extract(r#"NAME:\s*"Chassis".*?SN:\s*([A-Z0-9]+)"#, output) {
                return serial;
            }
            r"System serial number:\s*([A-Z0-9]+)"
        }
        ("cisco", "xrv") => r#"NAME:\s*"Rack 0".*?SN:\s*([A-Z0-9]+)"#,
        ("hp", "5945") => r"DEVICE_SERIAL_NUMBER\s*:\s*([A-Z0-9]+)",
        _ => return String::new(),
    };
    extract(pattern, output).unwrap_or_default()
}

fn extract(pattern: &str, output: &str) -> Option<String> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("static regex patterns are valid");
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_n9k_chassis_serial() {
        let output = r#"NAME: "Chassis", DESCR: "Nexus9000 C93180"
PID: N9K-C93180YC-EX   , VID: V02 , SN: fdo12345678
"#;
        assert_eq!(parse_serial("cisco", "n9k", output), "FDO12345678");
    }

    #[test]
    fn parses_c8k_chassis_before_fallback() {
        let output = r#"NAME: "Chassis", DESCR: "Cisco c8000v"
PID: C8000V, VID: V01, SN: abc999
"#;
        assert_eq!(parse_serial("cisco", "c8k", output), "ABC999");
    }

    #[test]
    fn parses_c8k_fallback_system_serial() {
        let output = "System serial number: xyz777\n";
        assert_eq!(parse_serial("cisco", "c8k", output), "XYZ777");
    }

    #[test]
    fn parses_xrv_rack_serial() {
        let output = r#"NAME: "Rack 0", DESCR: "Cisco XRv9000"
PID: R-XRV9000, VID: V01, SN: rv001122
"#;
        assert_eq!(parse_serial("cisco", "xrv", output), "RV001122");
    }

    #[test]
    fn parses_hp_device_serial() {
        let output = "DEVICE_SERIAL_NUMBER  :  hp0099zz\n";
        assert_eq!(parse_serial("hp", "5945", output), "HP0099ZZ");
    }

    #[test]
    fn unknown_pair_returns_empty() {
        assert_eq!(parse_serial("acme", "foo", "anything"), "");
    }

    #[test]
    fn no_match_returns_empty() {
        assert_eq!(parse_serial("cisco", "n9k", "no serial here"), "");
    }
}
