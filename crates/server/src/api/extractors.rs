use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::daemon::state::AppState;

use super::errors::ApiError;

/// Gate for every route but `/health`. A missing configured bearer token
/// means every request is rejected (§6: "Missing configured token → 401
/// for every request").
pub struct BearerAuth;

impl FromRequestParts<AppState> for BearerAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.bearer_token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(ApiError::unauthorized("no bearer token configured"));
        };

        let provided = parts
            .headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        match provided {
            Some(token) if token == expected => Ok(BearerAuth),
            _ => Err(ApiError::unauthorized("missing or invalid bearer token")),
        }
    }
}
