use serde::{Deserialize, Serialize};

/// The outcome of `release_machine`. Wire-exact per spec §6: the variant
/// names below serialize to `"success"`, `"already_available"`,
/// `"not_found"`, `"unreachable"`, `"failed"`.
///
/// We adopt this enum exclusively — no release path in this codebase
/// returns a bare `bool` (see SPEC_FULL.md's resolved open questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseResult {
    Success,
    AlreadyAvailable,
    NotFound,
    Unreachable,
    Failed,
}

impl ReleaseResult {
    /// The `(HTTP status, message)` pair the §6 table calls for. The
    /// façade only needs to translate this, never re-derive it.
    pub fn http_status_and_message(&self) -> (u16, &'static str) {
        match self {
            Self::Success => (200, "Release succeeded; device is rebooting"),
            Self::AlreadyAvailable => (200, "Device was already available"),
            Self::NotFound => (404, "No such device"),
            Self::Unreachable => (409, "Device is unreachable; cannot execute reset command"),
            Self::Failed => (500, "Failed to execute reset command on the device."),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyAvailable)
    }
}

impl std::fmt::Display for ReleaseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::AlreadyAvailable => "already_available",
            Self::NotFound => "not_found",
            Self::Unreachable => "unreachable",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
