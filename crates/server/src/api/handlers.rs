use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use shared::data::Device;
use tickets::SearchRequest;

use crate::daemon::state::AppState;

use super::errors::ApiError;
use super::extractors::BearerAuth;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct MachinesQuery {
    vendor: Option<String>,
    model: Option<String>,
    version: Option<String>,
    status: Option<String>,
}

pub async fn list_machines(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Query(query): Query<MachinesQuery>,
) -> Result<Json<Value>, ApiError> {
    let machines = state
        .inventory
        .list_machines(
            query.vendor.as_deref(),
            query.model.as_deref(),
            query.version.as_deref(),
            query.status.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "machines": machines })))
}

pub async fn reserve_machine(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path((vendor, model, version)): Path<(String, String, String)>,
) -> Result<Json<Device>, ApiError> {
    match state.inventory.reserve_machine(&vendor, &model, &version).await {
        Some(device) => Ok(Json(device)),
        None => Err(ApiError::not_found("Device", "No available machines found")),
    }
}

#[derive(Serialize)]
pub struct ReleaseResponse {
    status: String,
    message: String,
    machine: Option<Device>,
}

pub async fn release_machine(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let result = state.inventory.release_machine(&serial).await;
    let (status, message) = result.http_status_and_message();

    match status {
        404 => Err(ApiError::not_found("Device", message)),
        409 => Err(ApiError::conflict(message)),
        _ if status >= 400 => Err(ApiError::internal(message)),
        _ => {
            let machine = state.inventory.get_machine(&serial).await;
            Ok(Json(ReleaseResponse { status: result.to_string(), message: message.to_string(), machine }))
        }
    }
}

#[derive(Serialize)]
pub struct ReloadResponse {
    status: String,
    message: String,
    total: usize,
}

pub async fn admin_reload(_auth: BearerAuth, State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let total = state.inventory.reload_machines().await?;
    Ok(Json(ReloadResponse { status: "ok".to_string(), message: "catalog reloaded".to_string(), total }))
}

#[derive(Serialize)]
pub struct SubmitResponse {
    id: Uuid,
    status: String,
    message: String,
}

pub async fn submit_ticket(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path((vendor, model, version)): Path<(String, String, String)>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    let mut payload = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        payload = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
            .to_vec();
        break;
    }

    let ticket = state.tickets.submit(vendor, model, version, &payload).await?;
    Ok(Json(SubmitResponse { id: ticket.id, status: ticket.status.to_string(), message: "ticket submitted".to_string() }))
}

pub async fn get_ticket_result(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .tickets
        .get_response(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Ticket", format!("no such ticket: {id}")))
}

pub async fn search_tickets(
    _auth: BearerAuth,
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Value>, ApiError> {
    let tickets = state.tickets.list_tickets().await;
    let matches = tickets::search(&tickets, &request)?;
    Ok(Json(json!({ "tickets": matches })))
}
