use std::collections::HashMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use shared::data::Ticket;
use shared::error::TicketError;

const ALLOWED_FIELDS: &[&str] = &[
    "id",
    "vendor",
    "model",
    "version",
    "status",
    "enqueued_at",
    "started_at",
    "completed_at",
    "result_data",
    "machine.serial",
    "machine.ip",
    "machine.port",
];

const DATE_FIELD_NAMES: &[&str] = &["enqueued_at", "started_at", "completed_at"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<Timestamp>,
    #[serde(default)]
    pub to: Option<Timestamp>,
}

/// A ticket search request (§4.6). `field_values` holds one raw expected
/// string per field; a comma in that string splits it into an OR-list at
/// match time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub active_fields: Vec<String>,
    #[serde(default)]
    pub field_values: HashMap<String, String>,
    #[serde(default)]
    pub date_ranges: HashMap<String, DateRange>,
    #[serde(default)]
    pub result_data: Option<String>,
    #[serde(default)]
    pub raw_data: Option<String>,
}

impl SearchRequest {
    fn validate_fields(&self) -> Result<(), TicketError> {
        for field in self.active_fields.iter().chain(self.field_values.keys()) {
            if !ALLOWED_FIELDS.contains(&field.as_str()) {
                return Err(TicketError::UnknownSearchField(field.clone()));
            }
        }
        for field in self.date_ranges.keys() {
            if !DATE_FIELD_NAMES.contains(&field.as_str()) {
                return Err(TicketError::UnknownSearchField(field.clone()));
            }
        }
        Ok(())
    }
}

/// Filters `tickets` by `request`, matching the legacy search semantics
/// (§4.6): pure, synchronous, no I/O. Returns an error up front if the
/// request names a field outside the closed allow-list.
pub fn search<'a>(tickets: &'a [Ticket], request: &SearchRequest) -> Result<Vec<&'a Ticket>, TicketError> {
    request.validate_fields()?;

    Ok(tickets.iter().filter(|ticket| matches(ticket, request)).collect())
}

fn matches(ticket: &Ticket, request: &SearchRequest) -> bool {
    for field in &request.active_fields {
        let Some(expected) = request.field_values.get(field) else {
            continue;
        };
        if !matches_field(ticket, field, expected) {
            return false;
        }
    }

    for (field, expected) in &request.field_values {
        if request.active_fields.contains(field) {
            continue;
        }
        if !matches_field(ticket, field, expected) {
            return false;
        }
    }

    for (field, range) in &request.date_ranges {
        if range.from.is_none() && range.to.is_none() {
            continue;
        }
        let Some(value) = date_field_value(ticket, field) else {
            return false;
        };
        if let Some(from) = range.from {
            if value < from {
                return false;
            }
        }
        if let Some(to) = range.to {
            if value > to {
                return false;
            }
        }
    }

    if !contains(ticket.result_data.as_deref(), normalize(request.result_data.as_deref())) {
        return false;
    }
    if !contains(ticket.raw_data.as_deref(), normalize(request.raw_data.as_deref())) {
        return false;
    }

    true
}

fn matches_field(ticket: &Ticket, field: &str, expected: &str) -> bool {
    let expected_values = normalize_expected(expected);
    if expected_values.is_empty() {
        return true;
    }
    let Some(value) = field_value(ticket, field) else {
        return false;
    };
    expected_values.iter().any(|expected| contains(Some(&value), Some(expected)))
}

fn field_value(ticket: &Ticket, field: &str) -> Option<String> {
    match field {
        "id" => Some(ticket.id.to_string()),
        "vendor" => Some(ticket.vendor.clone()),
        "model" => Some(ticket.model.clone()),
        "version" => Some(ticket.version.clone()),
        "status" => Some(ticket.status.to_string()),
        "enqueued_at" => Some(ticket.enqueued_at.to_string()),
        "started_at" => ticket.started_at.map(|t| t.to_string()),
        "completed_at" => ticket.completed_at.map(|t| t.to_string()),
        "result_data" => ticket.result_data.clone(),
        "machine.serial" => ticket.device.as_ref().map(|d| d.serial.clone()),
        "machine.ip" => ticket.device.as_ref().map(|d| d.mgmt_ip.clone()),
        "machine.port" => ticket.device.as_ref().map(|d| d.port.to_string()),
        _ => None,
    }
}

fn date_field_value(ticket: &Ticket, field: &str) -> Option<Timestamp> {
    match field {
        "enqueued_at" => Some(ticket.enqueued_at),
        "started_at" => ticket.started_at,
        "completed_at" => ticket.completed_at,
        _ => None,
    }
}

/// ASCII-lowercase substring match. An absent expected term always
/// matches; an absent value never matches a present expected term.
fn contains(value: Option<&str>, expected: Option<&str>) -> bool {
    let Some(expected) = expected else { return true };
    let Some(value) = value else { return false };
    value.to_lowercase().contains(&expected.to_lowercase())
}

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Splits a comma-separated expected term into an OR-list, dropping blank
/// entries (the newer search variant, per the resolved open question).
fn normalize_expected(expected: &str) -> Vec<String> {
    expected
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::data::Device;

    fn sample_ticket() -> Ticket {
        let mut ticket = Ticket::new("cisco".into(), "n9k".into(), "9.3".into(), "/tmp/x.txt".into());
        ticket.device = Some(Device {
            serial: "ABC123".into(),
            vendor: "cisco".into(),
            model: "n9k".into(),
            version: "9.3".into(),
            mgmt_ip: "10.0.0.5".into(),
            port: 22,
            hostname: String::new(),
            default_gateway: None,
            netmask: None,
            status: shared::data::DeviceStatus::Unavailable,
        });
        ticket.result_data = Some("Processed cisco - n9k".into());
        ticket
    }

    #[test]
    fn unknown_field_is_rejected() {
        let tickets = vec![sample_ticket()];
        let request = SearchRequest {
            field_values: HashMap::from([("bogus".to_string(), "x".to_string())]),
            ..Default::default()
        };
        assert!(matches!(search(&tickets, &request), Err(TicketError::UnknownSearchField(_))));
    }

    #[test]
    fn matches_substring_case_insensitive() {
        let tickets = vec![sample_ticket()];
        let request = SearchRequest {
            field_values: HashMap::from([("vendor".to_string(), "CISCO".to_string())]),
            ..Default::default()
        };
        let results = search(&tickets, &request).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn comma_splits_into_or_list() {
        let tickets = vec![sample_ticket()];
        let request = SearchRequest {
            field_values: HashMap::from([("vendor".to_string(), "hp,cisco".to_string())]),
            ..Default::default()
        };
        let results = search(&tickets, &request).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn matches_dotted_machine_field() {
        let tickets = vec![sample_ticket()];
        let request = SearchRequest {
            field_values: HashMap::from([("machine.serial".to_string(), "abc".to_string())]),
            ..Default::default()
        };
        let results = search(&tickets, &request).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn non_matching_field_excludes_ticket() {
        let tickets = vec![sample_ticket()];
        let request = SearchRequest {
            field_values: HashMap::from([("vendor".to_string(), "hp".to_string())]),
            ..Default::default()
        };
        let results = search(&tickets, &request).unwrap();
        assert!(results.is_empty());
    }
}
