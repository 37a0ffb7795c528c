/// Whether a vendor's SSH session is a single non-interactive command or
/// an interactive pseudo-TTY fed a command stream on stdin (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshMode {
    SingleShot,
    Interactive,
}

/// The fixed command set and parse rule for a `(vendor, model)` pair,
/// keyed lower-case. Unknown pairs have no entry and `get_serial` returns
/// `None` without attempting a connection.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub ssh_mode: SshMode,
    pub inventory_commands: &'static [&'static str],
    pub resettable: bool,
}

pub fn profile_for(vendor: &str, model: &str) -> Option<DeviceProfile> {
    match (vendor, model) {
        ("cisco", "n9k") => Some(DeviceProfile {
            ssh_mode: SshMode::Interactive,
            inventory_commands: &["terminal length 0", "show inventory", "exit"],
            resettable: true,
        }),
        ("cisco", "c8k") => Some(DeviceProfile {
            ssh_mode: SshMode::Interactive,
            inventory_commands: &["terminal length 0", "show inventory", "show version", "exit"],
            resettable: true,
        }),
        ("cisco", "xrv") => Some(DeviceProfile {
            ssh_mode: SshMode::SingleShot,
            inventory_commands: &["show inventory"],
            resettable: false,
        }),
        ("hp", "5945") => Some(DeviceProfile {
            ssh_mode: SshMode::Interactive,
            inventory_commands: &["screen-length disable", "display device manuinfo", "exit"],
            resettable: false,
        }),
        _ => None,
    }
}
