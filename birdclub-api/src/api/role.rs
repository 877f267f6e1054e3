//! Role lookup endpoint
//!
//! POST /api/role `{ "email": ..., "externalId": ... }` → `{ role, user }`.
//! Other methods on the path get 405 from the router.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::services::{IdentityKey, ResolvedRole};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

/// POST /api/role
pub async fn resolve_role(
    State(state): State<AppState>,
    body: Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<Json<ResolvedRole>> {
    let Json(request) =
        body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let email = request
        .email
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("email is required".to_string()))?;
    let identity = IdentityKey::new(email, request.external_id.as_deref())?;

    match state.roles.resolve_role(&identity).await {
        Ok(resolved) => Ok(Json(resolved)),
        Err(e) => {
            error!(email = %identity.email, "Role resolution failed: {}", e);
            Err(ApiError::Internal(format!("Failed to resolve role: {}", e)))
        }
    }
}

pub fn role_routes() -> Router<AppState> {
    Router::new().route("/api/role", post(resolve_role))
}
