//! Grade handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use common::{AppResult, Paginated, PaginationParams};
use domain::{Grade, GradeForm, GradePatch};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::state::AppState;
use crate::repository::GradeQuery;

/// Create grade routes
pub fn grade_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_grades).post(create_grade))
        .route("/:id", get(get_grade).put(update_grade).delete(delete_grade))
}

/// List grades, latest exam first
#[utoipa::path(
    get,
    path = "/api/grades",
    tag = "Grades",
    security(("bearer_auth" = [])),
    params(PaginationParams, GradeQuery),
    responses(
        (status = 200, description = "Page of grades with student summary", body = GradePage),
        (status = 400, description = "Invalid page request"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_grades(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<GradeQuery>,
) -> AppResult<Json<Paginated<Grade>>> {
    let page = pagination.to_request()?;
    Ok(Json(state.records.grades.find(&query, page).await?))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    tag = "Grades",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade", body = Grade),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Grade not found")
    )
)]
pub async fn get_grade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Grade>> {
    Ok(Json(state.records.grades.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/grades",
    tag = "Grades",
    security(("bearer_auth" = [])),
    request_body = GradeForm,
    responses(
        (status = 201, description = "Grade created", body = Grade),
        (status = 400, description = "Validation error or unknown student"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_grade(
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<GradeForm>,
) -> AppResult<(StatusCode, Json<Grade>)> {
    let grade = state.records.grades.create(&form).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    tag = "Grades",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Grade ID")),
    request_body = GradePatch,
    responses(
        (status = 200, description = "Grade updated", body = Grade),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Grade not found")
    )
)]
pub async fn update_grade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<GradePatch>,
) -> AppResult<Json<Grade>> {
    Ok(Json(state.records.grades.update(id, &patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    tag = "Grades",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 204, description = "Grade deleted, or already absent"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn delete_grade(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;
    state.records.grades.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
