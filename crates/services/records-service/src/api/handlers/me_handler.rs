//! Current user handler.

use axum::{extract::Extension, response::Json, routing::get, Router};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;

/// Identity of the caller as read from the token
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[schema(example = "teacher")]
    pub role: String,
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/", get(get_current_user))
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Session",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(Extension(current_user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        id: current_user.id,
        email: current_user.email,
        role: current_user.role.to_string(),
    })
}
