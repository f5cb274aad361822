//! Login record handlers.

use axum::{
    extract::{Extension, Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use common::{AppResult, Paginated, PaginationParams};
use domain::{LoginRecord, LoginStatus};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::state::AppState;
use crate::repository::LoginRecordQuery;

/// Login attempt reported by the client after signing in
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RecordLoginRequest {
    /// Defaults to `success`
    #[serde(default)]
    pub status: Option<LoginStatus>,
}

pub fn login_record_routes() -> Router<AppState> {
    Router::new().route("/", get(list_login_records).post(record_login))
}

/// List login records (admin, or the caller's own)
#[utoipa::path(
    get,
    path = "/api/login-records",
    tag = "Login records",
    security(("bearer_auth" = [])),
    params(PaginationParams, LoginRecordQuery),
    responses(
        (status = 200, description = "Page of login records, latest first", body = LoginRecordPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - other users' records are admin only")
    )
)]
pub async fn list_login_records(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<LoginRecordQuery>,
) -> AppResult<Json<Paginated<LoginRecord>>> {
    if query.user_id != Some(current_user.id) {
        require_admin(&current_user)?;
    }

    let page = pagination.to_request()?;
    Ok(Json(state.records.login_records.find(&query, page).await?))
}

/// Record a login of the caller
#[utoipa::path(
    post,
    path = "/api/login-records",
    tag = "Login records",
    security(("bearer_auth" = [])),
    request_body = RecordLoginRequest,
    responses(
        (status = 201, description = "Login recorded", body = LoginRecord),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn record_login(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<RecordLoginRequest>,
) -> AppResult<(StatusCode, Json<LoginRecord>)> {
    let record = state
        .records
        .login_records
        .record_login(
            current_user.id,
            client_ip(&headers),
            header_text(&headers, USER_AGENT.as_str()).unwrap_or_else(|| "unknown".to_string()),
            payload.status.unwrap_or(LoginStatus::Success),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// First address of `X-Forwarded-For`, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> String {
    header_text(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_text(headers, "x-real-ip"))
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        assert_eq!(client_ip(&headers), "10.0.0.7");
    }

    #[test]
    fn test_client_ip_unknown_without_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
