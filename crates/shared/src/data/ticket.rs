use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::device::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A legacy-path test job: an uploaded configuration payload bound to a
/// device-backed background task.
///
/// Invariant: a ticket in `Running` always carries `Some(device)`, and
/// that device's status is `Unavailable` with this ticket's id recorded
/// as its holder (tracked out-of-band by the inventory engine, not on
/// this struct, to avoid an owning cycle — see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub vendor: String,
    pub model: String,
    pub version: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub enqueued_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub device: Option<Device>,
    pub result_data: Option<String>,
    /// Free-text job output, searchable via `/tickets/search`'s `raw_data`
    /// filter. Not part of the public ticket JSON response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

impl Ticket {
    pub fn new(vendor: String, model: String, version: String, config_path: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor,
            model,
            version,
            status: TicketStatus::Queued,
            config_path: Some(config_path),
            enqueued_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            device: None,
            result_data: None,
            raw_data: None,
        }
    }
}
