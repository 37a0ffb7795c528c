use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use jiff::Timestamp;
use tokio::sync::Mutex;
use uuid::Uuid;

use inventory::Inventory;
use shared::data::{Ticket, TicketStatus};
use shared::error::TicketError;
use shared::konst::{SIMULATED_JOB_DURATION_SECS, SIMULATED_RESET_DELAY_SECS};

use crate::storage::{self, RecoveredTicket};

/// The legacy in-process job engine layered on the inventory engine
/// (§4.5). `tickets` holds every live (queued or running) ticket;
/// `queue` is the strict-FIFO admission order.
pub struct TicketScheduler {
    inventory: Arc<Inventory>,
    ticket_root: String,
    tickets: Mutex<HashMap<Uuid, Ticket>>,
    queue: Mutex<VecDeque<Uuid>>,
}

impl TicketScheduler {
    pub async fn load(inventory: Arc<Inventory>, ticket_root: String) -> Result<Arc<Self>> {
        let scheduler = Arc::new(Self {
            inventory,
            ticket_root,
            tickets: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
        });
        scheduler.recover_active_tickets().await;
        Ok(scheduler)
    }

    /// Rehydrates unfinished tickets found under `active/` at startup. A
    /// ticket whose archive JSON already exists completed between the
    /// active file being written and the process exiting; we archive the
    /// stale active file without re-running it rather than double
    /// submitting the job (resolved open question, §9).
    async fn recover_active_tickets(self: &Arc<Self>) {
        let recovered = storage::scan_active_tickets(&self.ticket_root);
        for RecoveredTicket { vendor, model, version, id, path } in recovered {
            let Ok(uuid) = id.parse::<Uuid>() else {
                tracing::warn!(id, "skipping active ticket file with non-uuid name");
                continue;
            };

            if storage::archive_json_path(&self.ticket_root, &vendor, &model, &version, &id)
                .try_exists()
                .unwrap_or(false)
            {
                tracing::info!(id, "active ticket already completed before crash; archiving without re-running");
                let _ = tokio::fs::remove_file(&path).await;
                continue;
            }

            tracing::info!(id, vendor, model, version, "reloading unfinished ticket from storage");
            let mut ticket = Ticket::new(vendor, model, version, path.to_string_lossy().into_owned());
            ticket.id = uuid;
            self.tickets.lock().await.insert(uuid, ticket);
            self.queue.lock().await.push_back(uuid);
        }
        self.consume().await;
    }

    /// Rejects empty payloads and unsupported triples, persists the
    /// payload, records the ticket, enqueues it, and immediately attempts
    /// admission (§4.5).
    pub async fn submit(
        self: &Arc<Self>,
        vendor: String,
        model: String,
        version: String,
        payload: &[u8],
    ) -> Result<Ticket, TicketError> {
        if payload.is_empty() {
            return Err(TicketError::EmptyPayload);
        }

        let supported = self.inventory.supported_versions().await;
        let supports_triple = supported
            .get(&vendor)
            .and_then(|models| models.get(&model))
            .map(|versions| versions.contains(&version))
            .unwrap_or(false);
        if !supports_triple {
            return Err(TicketError::UnsupportedTriple { vendor, model, version });
        }

        let ticket = Ticket::new(vendor, model, version, String::new());
        let id = ticket.id.to_string();
        let config_path = storage::active_payload_path(&self.ticket_root, &ticket.vendor, &ticket.model, &ticket.version, &id);

        storage::write_active_payload(&self.ticket_root, &ticket, payload)
            .await
            .map_err(|err| TicketError::Storage(err.to_string()))?;

        let mut ticket = ticket;
        ticket.config_path = Some(config_path.to_string_lossy().into_owned());

        self.tickets.lock().await.insert(ticket.id, ticket.clone());
        self.queue.lock().await.push_back(ticket.id);

        self.consume().await;
        Ok(ticket)
    }

    /// One admission attempt: pop the head, try to reserve a device for
    /// its triple. On failure, re-push at the head to preserve FIFO
    /// ordering and stop — this does not iterate past the first failure
    /// (§4.5).
    async fn consume(self: &Arc<Self>) {
        let Some(id) = self.queue.lock().await.pop_front() else {
            return;
        };

        let (vendor, model, version) = {
            let tickets = self.tickets.lock().await;
            let Some(ticket) = tickets.get(&id) else {
                return;
            };
            (ticket.vendor.clone(), ticket.model.clone(), ticket.version.clone())
        };

        let Some(device) = self.inventory.reserve_machine(&vendor, &model, &version).await else {
            self.queue.lock().await.push_front(id);
            return;
        };

        {
            let mut tickets = self.tickets.lock().await;
            if let Some(ticket) = tickets.get_mut(&id) {
                ticket.status = TicketStatus::Running;
                ticket.started_at = Some(Timestamp::now());
                ticket.device = Some(device);
            }
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run_job(id).await });
    }

    /// Simulated work standing in for a real test run: reset delay, job
    /// duration, then completion (§4.5). The real device reset happens
    /// later, when the ticket's device is released.
    async fn run_job(self: Arc<Self>, id: Uuid) {
        tokio::time::sleep(Duration::from_secs(SIMULATED_RESET_DELAY_SECS)).await;
        tokio::time::sleep(Duration::from_secs(SIMULATED_JOB_DURATION_SECS)).await;

        let result_data = {
            let tickets = self.tickets.lock().await;
            tickets
                .get(&id)
                .map(|t| format!("Processed {} - {}", t.vendor, t.model))
        };

        self.complete(id, result_data, true).await;
    }

    /// Validates the ticket still holds its device, releases it, sets
    /// the terminal status, archives the ticket, and attempts the next
    /// admission (§4.5).
    async fn complete(self: &Arc<Self>, id: Uuid, result_data: Option<String>, success: bool) {
        let ticket = {
            let mut tickets = self.tickets.lock().await;
            let Some(ticket) = tickets.get_mut(&id) else {
                tracing::warn!(%id, "completion for unknown ticket");
                return;
            };
            if ticket.status != TicketStatus::Running || ticket.device.is_none() {
                tracing::warn!(%id, "ignoring completion for ticket with no allocated device");
                return;
            }

            ticket.status = if success { TicketStatus::Completed } else { TicketStatus::Failed };
            ticket.completed_at = Some(Timestamp::now());
            ticket.result_data = result_data;
            ticket.clone()
        };

        let serial = ticket.device.as_ref().unwrap().serial.clone();
        let release_result = self.inventory.release_machine(&serial).await;
        tracing::info!(%id, serial, ?release_result, "released ticket's device");

        if let Err(err) = storage::archive_ticket(&self.ticket_root, &ticket).await {
            tracing::error!(%id, %err, "failed to archive ticket");
        }

        self.tickets.lock().await.remove(&id);
        self.consume().await;
    }

    pub async fn get_ticket(&self, id: Uuid) -> Option<Ticket> {
        self.tickets.lock().await.get(&id).cloned()
    }

    /// Live tickets first; on miss, the archive directory for `{id}.json`
    /// (§4.5).
    pub async fn get_response(&self, id: Uuid) -> Option<serde_json::Value> {
        if let Some(ticket) = self.get_ticket(id).await {
            return serde_json::to_value(ticket).ok();
        }
        storage::find_archived_response(&self.ticket_root, &id.to_string()).await
    }

    pub async fn list_tickets(&self) -> Vec<Ticket> {
        self.tickets.lock().await.values().cloned().collect()
    }

    /// Removes a ticket's on-disk payload and its in-memory entry. Not
    /// wired to any HTTP route (§6's route table is exhaustive); used by
    /// cleanup tooling and tests.
    pub async fn delete_ticket(&self, id: Uuid) {
        let ticket = self.tickets.lock().await.remove(&id);
        if let Some(ticket) = ticket {
            storage::remove_active_payload(&self.ticket_root, &ticket.vendor, &ticket.model, &ticket.version, &id.to_string()).await;
        }
    }

    /// `queued_count`, `running_count`, and each queued ticket's 1-based
    /// position, for the FIFO scenario tests (§8 scenario 6).
    pub async fn queue_status(&self) -> QueueStatus {
        let tickets = self.tickets.lock().await;
        let queue = self.queue.lock().await;

        let running_count = tickets.values().filter(|t| t.status == TicketStatus::Running).count();
        let queue_position = queue
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx + 1))
            .collect();

        QueueStatus {
            queued_count: queue.len(),
            running_count,
            queue_position,
        }
    }
}

pub struct QueueStatus {
    pub queued_count: usize,
    pub running_count: usize,
    pub queue_position: HashMap<Uuid, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn load_fixture(dir: &std::path::Path, device_count: usize) -> Arc<TicketScheduler> {
        let mut devices = String::new();
        for i in 0..device_count {
            devices.push_str(&format!(
                "      - serial: S{i}\n        mgmt_ip: 127.0.0.1\n        port: 22\n"
            ));
        }
        let catalog = format!("acme:\n  foo:\n    \"1.0\":\n{devices}");
        fs::write(dir.join("devices.yaml"), catalog).unwrap();
        fs::write(dir.join("credentials.yaml"), "default:\n  username: admin\n  password: secret\n").unwrap();

        let inventory = Arc::new(
            Inventory::load(
                dir.join("devices.yaml").to_str().unwrap(),
                dir.join("credentials.yaml").to_str().unwrap(),
            )
            .await
            .unwrap(),
        );
        let ticket_root = dir.join("tickets").to_str().unwrap().to_owned();
        TicketScheduler::load(inventory, ticket_root).await.unwrap()
    }

    #[tokio::test]
    async fn submit_rejects_empty_payload() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = load_fixture(dir.path(), 1).await;
        let result = scheduler.submit("acme".into(), "foo".into(), "1.0".into(), &[]).await;
        assert!(matches!(result, Err(TicketError::EmptyPayload)));
    }

    #[tokio::test]
    async fn submit_rejects_unsupported_triple() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = load_fixture(dir.path(), 1).await;
        let result = scheduler.submit("acme".into(), "bar".into(), "9.9".into(), b"data").await;
        assert!(matches!(result, Err(TicketError::UnsupportedTriple { .. })));
    }

    #[tokio::test]
    async fn submit_immediately_admits_when_device_available() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = load_fixture(dir.path(), 1).await;
        let ticket = scheduler.submit("acme".into(), "foo".into(), "1.0".into(), b"data").await.unwrap();

        let status = scheduler.queue_status().await;
        assert_eq!(status.running_count, 1);
        assert_eq!(status.queued_count, 0);

        let live = scheduler.get_ticket(ticket.id).await.unwrap();
        assert_eq!(live.status, TicketStatus::Running);
        assert!(live.device.is_some());
    }

    #[tokio::test]
    async fn second_submission_queues_behind_the_first_when_no_device_free() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = load_fixture(dir.path(), 1).await;

        let first = scheduler.submit("acme".into(), "foo".into(), "1.0".into(), b"data").await.unwrap();
        let second = scheduler.submit("acme".into(), "foo".into(), "1.0".into(), b"data").await.unwrap();

        let status = scheduler.queue_status().await;
        assert_eq!(status.queued_count, 1);
        assert_eq!(status.running_count, 1);
        assert_eq!(status.queue_position.get(&second.id), Some(&1));

        let first_live = scheduler.get_ticket(first.id).await.unwrap();
        assert_eq!(first_live.status, TicketStatus::Running);
    }
}
