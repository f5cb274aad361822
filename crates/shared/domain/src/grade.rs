//! Grade entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::student::StudentSummary;
use crate::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Midterm,
    Final,
    Quiz,
    Homework,
}

/// Grade entity as stored, with the owning student's summary when joined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Grade {
    pub id: Uuid,
    /// Primary key of the graded student
    pub student_id: Uuid,
    pub subject: String,
    pub score: f64,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    pub semester: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, rename = "students", skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
}

impl Record for Grade {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Grade creation data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GradeForm {
    pub student_id: Uuid,
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject: String,
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100"))]
    pub score: f64,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    #[validate(length(min = 1, message = "Semester cannot be empty"))]
    pub semester: String,
}

/// Partial grade update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GradePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<ExamType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Semester cannot be empty"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
}
