//! Student handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use common::{AppResult, Paginated, PaginationParams};
use domain::{Student, StudentForm, StudentPatch};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::state::AppState;
use crate::repository::{StudentQuery, SubjectStat};

/// Create student routes
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:id", get(get_student).put(update_student).delete(delete_student))
        .route("/:id/grade-stats", get(student_grade_stats))
}

/// List students, newest first
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Students",
    security(("bearer_auth" = [])),
    params(PaginationParams, StudentQuery),
    responses(
        (status = 200, description = "Page of students", body = StudentPage),
        (status = 400, description = "Invalid page request"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(query): Query<StudentQuery>,
) -> AppResult<Json<Paginated<Student>>> {
    let page = pagination.to_request()?;
    let students = state.records.students.find(&query, page).await?;
    Ok(Json(students))
}

/// Get student by ID
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "Students",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.records.students.get(id).await?))
}

/// Create a student
#[utoipa::path(
    post,
    path = "/api/students",
    tag = "Students",
    security(("bearer_auth" = [])),
    request_body = StudentForm,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Validation error or duplicate student number"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<StudentForm>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = state.records.students.create(&form).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Update a student
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    tag = "Students",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = StudentPatch,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<StudentPatch>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.records.students.update(id, &patch).await?))
}

/// Delete a student (admin only)
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    tag = "Students",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted, or already absent"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn delete_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&current_user)?;
    state.records.students.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Average score per subject for one student
#[utoipa::path(
    get,
    path = "/api/students/{id}/grade-stats",
    tag = "Students",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Per-subject averages", body = Vec<SubjectStat>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn student_grade_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<SubjectStat>>> {
    Ok(Json(state.records.grades.student_stats(id).await?))
}
