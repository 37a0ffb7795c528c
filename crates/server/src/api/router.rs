use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::daemon::state::AppState;

use super::handlers::{
    admin_reload, get_ticket_result, health_check, list_machines, release_machine, reserve_machine,
    search_tickets, submit_ticket,
};

/// Builds the axum router implementing §6's REST surface exactly:
/// `/health` open, everything else bearer-gated via `BearerAuth`.
pub fn build_router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .route("/machines", get(list_machines))
        .route("/reserve/{vendor}/{model}/{version}", post(reserve_machine))
        .route("/release/{serial}", post(release_machine))
        .route("/admin/reload", post(admin_reload))
        .route("/request/{vendor}/{model}/{version}", post(submit_ticket))
        .route("/result/{id}", get(get_ticket_result))
        .route("/tickets/search", post(search_tickets))
        .layer(cors)
}
