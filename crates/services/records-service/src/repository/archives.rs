//! Archive entries, joined to the student and signed by their author.

use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

use common::AppResult;
use domain::{Archive, ArchiveForm, ArchiveType, ENTITY_ARCHIVES, ENTITY_STUDENTS};

use super::base::{EntityConfig, EntityQuery, Repository};
use crate::store::{Filter, Join, SortSpec, TableSpec};

pub type ArchiveRepository = Repository<Archive>;

pub fn config() -> EntityConfig {
    EntityConfig::new(ENTITY_ARCHIVES, SortSpec::desc("date"))
        .with_join(Join::new(ENTITY_STUDENTS, "student_id").columns(&["name", "student_id"]))
}

pub fn table() -> TableSpec {
    TableSpec::new(ENTITY_ARCHIVES)
        .required(&["student_id", "title", "content", "type", "date", "created_by"])
        .timestamps()
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArchiveQuery {
    pub student_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<ArchiveType>,
}

impl EntityQuery for ArchiveQuery {
    fn filter(&self) -> Filter {
        Filter::new()
            .eq_id_opt("student_id", self.student_id)
            .eq_opt("type", self.kind.map(|k| k.as_str()))
    }
}

/// Row written for a new entry: the form plus its author.
#[derive(Serialize)]
struct NewArchive<'a> {
    #[serde(flatten)]
    form: &'a ArchiveForm,
    created_by: Uuid,
}

impl Repository<Archive> {
    pub async fn create_for(&self, form: &ArchiveForm, created_by: Uuid) -> AppResult<Archive> {
        self.create(&NewArchive { form, created_by }).await
    }
}
