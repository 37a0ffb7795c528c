use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shared::data::Ticket;
use shared::konst::{TICKET_ACTIVE_DIR, TICKET_ARCHIVE_DIR};

pub fn active_payload_path(ticket_root: &str, vendor: &str, model: &str, version: &str, id: &str) -> PathBuf {
    Path::new(ticket_root)
        .join(TICKET_ACTIVE_DIR)
        .join(vendor)
        .join(model)
        .join(version)
        .join(format!("{id}.txt"))
}

fn archive_dir(ticket_root: &str, vendor: &str, model: &str, version: &str, id: &str) -> PathBuf {
    Path::new(ticket_root)
        .join(TICKET_ARCHIVE_DIR)
        .join(vendor)
        .join(model)
        .join(version)
        .join(id)
}

pub fn archive_json_path(ticket_root: &str, vendor: &str, model: &str, version: &str, id: &str) -> PathBuf {
    archive_dir(ticket_root, vendor, model, version, id).join(format!("{id}.json"))
}

/// Persists the uploaded payload for a freshly submitted ticket.
pub async fn write_active_payload(ticket_root: &str, ticket: &Ticket, payload: &[u8]) -> Result<()> {
    let path = active_payload_path(ticket_root, &ticket.vendor, &ticket.model, &ticket.version, &ticket.id.to_string());
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.context("creating active ticket directory")?;
    }
    tokio::fs::write(&path, payload).await.context("writing active ticket payload")?;
    Ok(())
}

/// Moves the active payload into the archive directory and writes the
/// `{id}.json` response sibling, per §4.5's `_complete` contract.
pub async fn archive_ticket(ticket_root: &str, ticket: &Ticket) -> Result<()> {
    let id = ticket.id.to_string();
    let active = active_payload_path(ticket_root, &ticket.vendor, &ticket.model, &ticket.version, &id);
    let dir = archive_dir(ticket_root, &ticket.vendor, &ticket.model, &ticket.version, &id);
    tokio::fs::create_dir_all(&dir).await.context("creating archive directory")?;

    let archived_txt = dir.join(format!("{id}.txt"));
    if tokio::fs::try_exists(&active).await.unwrap_or(false) {
        tokio::fs::rename(&active, &archived_txt)
            .await
            .context("archiving active ticket payload")?;
    }

    let response = serde_json::to_vec_pretty(ticket).context("serializing ticket response")?;
    tokio::fs::write(dir.join(format!("{id}.json")), response)
        .await
        .context("writing archived ticket response")?;
    Ok(())
}

/// Searches `{ticket_root}/archive/**/{id}/{id}.json` without needing the
/// ticket's triple, for `GetResponse(id)`'s archive fallback.
pub async fn find_archived_response(ticket_root: &str, id: &str) -> Option<serde_json::Value> {
    let archive_root = Path::new(ticket_root).join(TICKET_ARCHIVE_DIR);
    let target_name = format!("{id}.json");
    let path = find_file(&archive_root, &target_name, 4)?;
    let contents = tokio::fs::read(&path).await.ok()?;
    serde_json::from_slice(&contents).ok()
}

fn find_file(dir: &Path, name: &str, max_depth: u8) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some(name) {
            return Some(path);
        }
        if max_depth > 0 && path.is_dir() {
            if let Some(found) = find_file(&path, name, max_depth - 1) {
                return Some(found);
            }
        }
    }
    None
}

/// Removes a ticket's active payload file, if any (§4.5 supplemental
/// deletion path; no change to in-memory state here).
pub async fn remove_active_payload(ticket_root: &str, vendor: &str, model: &str, version: &str, id: &str) {
    let path = active_payload_path(ticket_root, vendor, model, version, id);
    let _ = tokio::fs::remove_file(&path).await;
}

/// An `(vendor, model, version, id)` tuple for an unfinished ticket found
/// on disk at startup, along with its payload path.
pub struct RecoveredTicket {
    pub vendor: String,
    pub model: String,
    pub version: String,
    pub id: String,
    pub path: PathBuf,
}

/// Walks `{ticket_root}/active/*/*/*/*.txt` looking for unfinished
/// tickets left over from a prior process (§4.5's crash recovery).
pub fn scan_active_tickets(ticket_root: &str) -> Vec<RecoveredTicket> {
    let mut found = Vec::new();
    let active_root = Path::new(ticket_root).join(TICKET_ACTIVE_DIR);

    let Ok(vendors) = std::fs::read_dir(&active_root) else {
        return found;
    };
    for vendor_entry in vendors.flatten() {
        let Ok(vendor_file_type) = vendor_entry.file_type() else { continue };
        if !vendor_file_type.is_dir() {
            continue;
        }
        let vendor = vendor_entry.file_name().to_string_lossy().into_owned();

        let Ok(models) = std::fs::read_dir(vendor_entry.path()) else { continue };
        for model_entry in models.flatten() {
            if !model_entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let model = model_entry.file_name().to_string_lossy().into_owned();

            let Ok(versions) = std::fs::read_dir(model_entry.path()) else { continue };
            for version_entry in versions.flatten() {
                if !version_entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    continue;
                }
                let version = version_entry.file_name().to_string_lossy().into_owned();

                let Ok(files) = std::fs::read_dir(version_entry.path()) else { continue };
                for file_entry in files.flatten() {
                    let path = file_entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                        continue;
                    }
                    let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                        continue;
                    };
                    found.push(RecoveredTicket {
                        vendor: vendor.clone(),
                        model: model.clone(),
                        version: version.clone(),
                        id,
                        path,
                    });
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn archive_then_find_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();

        let mut ticket = Ticket::new("acme".into(), "foo".into(), "1.0".into(), String::new());
        write_active_payload(root, &ticket, b"payload").await.unwrap();

        ticket.status = shared::data::TicketStatus::Completed;
        archive_ticket(root, &ticket).await.unwrap();

        let found = find_archived_response(root, &ticket.id.to_string()).await;
        assert!(found.is_some());

        let active_still_there = active_payload_path(root, "acme", "foo", "1.0", &ticket.id.to_string()).exists();
        assert!(!active_still_there);
    }

    #[test]
    fn scan_active_tickets_finds_nested_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        let active_dir = dir.path().join("active").join("acme").join("foo").join("1.0");
        std::fs::create_dir_all(&active_dir).unwrap();
        std::fs::write(active_dir.join("11111111-1111-1111-1111-111111111111.txt"), b"x").unwrap();

        let found = scan_active_tickets(dir.path().to_str().unwrap());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vendor, "acme");
        assert_eq!(found[0].id, "11111111-1111-1111-1111-111111111111");
    }
}
