//! Students: searchable by name or student number.

use serde::Deserialize;
use utoipa::IntoParams;

use domain::{Student, StudentStatus, COLUMN_CREATED_AT, ENTITY_STUDENTS};

use super::base::{EntityConfig, EntityQuery, Repository};
use crate::store::{contains_pattern, Filter, SortSpec, TableSpec};

pub type StudentRepository = Repository<Student>;

pub fn config() -> EntityConfig {
    EntityConfig::new(ENTITY_STUDENTS, SortSpec::desc(COLUMN_CREATED_AT))
}

pub fn table() -> TableSpec {
    TableSpec::new(ENTITY_STUDENTS)
        .required(&[
            "student_id",
            "name",
            "gender",
            "birth_date",
            "class_name",
            "enrollment_date",
            "status",
        ])
        .unique(&["student_id"])
        .timestamps()
}

/// Student list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentQuery {
    /// Substring of the name or the student number
    pub search: Option<String>,
    pub status: Option<StudentStatus>,
    /// Substring of the class name
    pub class_name: Option<String>,
}

impl EntityQuery for StudentQuery {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new().eq_opt("status", self.status.map(|s| s.as_str()));

        if let Some(term) = non_blank(&self.search) {
            filter = filter.any_pattern(["name", "student_id"], contains_pattern(term));
        }
        if let Some(class_name) = non_blank(&self.class_name) {
            filter = filter.pattern("class_name", contains_pattern(class_name));
        }
        filter
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
