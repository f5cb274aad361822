//! Archive entries: rewards, punishments, activities and notes kept per student.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::student::StudentSummary;
use crate::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    Reward,
    Punishment,
    Activity,
    Note,
}

impl ArchiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Reward => "reward",
            ArchiveType::Punishment => "punishment",
            ArchiveType::Activity => "activity",
            ArchiveType::Note => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Archive {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ArchiveType,
    pub date: NaiveDate,
    /// User who wrote the entry
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, rename = "students", skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
}

impl Record for Archive {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Archive creation data; the author is taken from the session, not the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ArchiveForm {
    pub student_id: Uuid,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ArchiveType,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ArchivePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArchiveType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_type_uses_type_key() {
        let form = ArchiveForm {
            student_id: Uuid::nil(),
            title: "Science fair".to_string(),
            content: "First place".to_string(),
            kind: ArchiveType::Reward,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["type"], "reward");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_empty_patch_serializes_to_empty_object() {
        let value = serde_json::to_value(ArchivePatch::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
