//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use common::{ArchivePage, GradePage, LoginRecordPage, PaginationMeta, StudentPage};
use domain::{
    Archive, ArchiveForm, ArchivePatch, ArchiveType, ExamType, Gender, Grade, GradeForm,
    GradePatch, LoginRecord, LoginStatus, Student, StudentForm, StudentPatch, StudentStatus,
    StudentSummary,
};

use crate::api::handlers::login_record_handler::RecordLoginRequest;
use crate::api::handlers::me_handler::MeResponse;
use crate::repository::SubjectStat;

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::me_handler::get_current_user,
        crate::api::handlers::student_handler::list_students,
        crate::api::handlers::student_handler::get_student,
        crate::api::handlers::student_handler::create_student,
        crate::api::handlers::student_handler::update_student,
        crate::api::handlers::student_handler::delete_student,
        crate::api::handlers::student_handler::student_grade_stats,
        crate::api::handlers::grade_handler::list_grades,
        crate::api::handlers::grade_handler::get_grade,
        crate::api::handlers::grade_handler::create_grade,
        crate::api::handlers::grade_handler::update_grade,
        crate::api::handlers::grade_handler::delete_grade,
        crate::api::handlers::archive_handler::list_archives,
        crate::api::handlers::archive_handler::get_archive,
        crate::api::handlers::archive_handler::create_archive,
        crate::api::handlers::archive_handler::update_archive,
        crate::api::handlers::archive_handler::delete_archive,
        crate::api::handlers::login_record_handler::list_login_records,
        crate::api::handlers::login_record_handler::record_login,
    ),
    components(
        schemas(
            MeResponse,
            Student, StudentForm, StudentPatch, StudentStatus, StudentSummary, Gender, StudentPage,
            Grade, GradeForm, GradePatch, ExamType, GradePage, SubjectStat,
            Archive, ArchiveForm, ArchivePatch, ArchiveType, ArchivePage,
            LoginRecord, LoginStatus, LoginRecordPage, RecordLoginRequest,
            PaginationMeta,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Session", description = "Caller identity"),
        (name = "Students", description = "Student records"),
        (name = "Grades", description = "Exam grades"),
        (name = "Archives", description = "Rewards, punishments, activities and notes"),
        (name = "Login records", description = "Login audit trail"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
