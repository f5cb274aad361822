//! Archive handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use common::{AppResult, Paginated, PaginationParams};
use domain::{Archive, ArchiveForm, ArchivePatch};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::state::AppState;
use crate::repository::ArchiveQuery;

/// Create archive routes
pub fn archive_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_archives).post(create_archive))
        .route("/:id", get(get_archive).put(update_archive).delete(delete_archive))
}

#[utoipa::path(
    get,
    path = "/api/archives",
    tag = "Archives",
    security(("bearer_auth" = [])),
    params(PaginationParams, ArchiveQuery),
    responses(
        (status = 200, description = "Page of archive entries, newest date first", body = ArchivePage),
        (status = 400, description = "Invalid page request"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_archives(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<ArchiveQuery>,
) -> AppResult<Json<Paginated<Archive>>> {
    let page = pagination.to_request()?;
    Ok(Json(state.records.archives.find(&query, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/archives/{id}",
    tag = "Archives",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Archive entry ID")),
    responses(
        (status = 200, description = "Archive entry", body = Archive),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Archive entry not found")
    )
)]
pub async fn get_archive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Archive>> {
    Ok(Json(state.records.archives.get(id).await?))
}

/// Create an archive entry authored by the caller
#[utoipa::path(
    post,
    path = "/api/archives",
    tag = "Archives",
    security(("bearer_auth" = [])),
    request_body = ArchiveForm,
    responses(
        (status = 201, description = "Archive entry created", body = Archive),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_archive(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<ArchiveForm>,
) -> AppResult<(StatusCode, Json<Archive>)> {
    let archive = state
        .records
        .archives
        .create_for(&form, current_user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(archive)))
}

#[utoipa::path(
    put,
    path = "/api/archives/{id}",
    tag = "Archives",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Archive entry ID")),
    request_body = ArchivePatch,
    responses(
        (status = 200, description = "Archive entry updated", body = Archive),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Archive entry not found")
    )
)]
pub async fn update_archive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<ArchivePatch>,
) -> AppResult<Json<Archive>> {
    Ok(Json(state.records.archives.update(id, &patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/archives/{id}",
    tag = "Archives",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Archive entry ID")),
    responses(
        (status = 204, description = "Archive entry deleted, or already absent"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn delete_archive(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;
    state.records.archives.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
