//! Grades, joined to the student's name and number.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use common::AppResult;
use domain::{Grade, ENTITY_GRADES, ENTITY_STUDENTS};

use super::aggregate::AggregateStat;
use super::base::{EntityConfig, EntityQuery, Repository};
use super::students::non_blank;
use crate::store::{Filter, Join, SortSpec, TableSpec};

pub type GradeRepository = Repository<Grade>;

pub fn config() -> EntityConfig {
    EntityConfig::new(ENTITY_GRADES, SortSpec::desc("exam_date"))
        .with_join(Join::new(ENTITY_STUDENTS, "student_id").columns(&["name", "student_id"]))
}

pub fn table() -> TableSpec {
    TableSpec::new(ENTITY_GRADES)
        .required(&["student_id", "subject", "score", "exam_type", "exam_date", "semester"])
        .timestamps()
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradeQuery {
    pub student_id: Option<Uuid>,
    pub subject: Option<String>,
}

impl EntityQuery for GradeQuery {
    fn filter(&self) -> Filter {
        Filter::new()
            .eq_id_opt("student_id", self.student_id)
            .eq_opt("subject", non_blank(&self.subject))
    }
}

/// Average score of one student in one subject
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubjectStat {
    pub subject: String,
    pub average: f64,
    pub count: u64,
}

impl From<AggregateStat> for SubjectStat {
    fn from(stat: AggregateStat) -> Self {
        Self {
            subject: stat.group_key,
            average: stat.average,
            count: stat.count,
        }
    }
}

impl Repository<Grade> {
    /// Per-subject averages of one student, in order of first grade seen.
    pub async fn student_stats(&self, student_id: Uuid) -> AppResult<Vec<SubjectStat>> {
        let filter = Filter::new().eq_id("student_id", student_id);
        let stats = self.aggregate("subject", "score", filter).await?;
        Ok(stats.into_iter().map(SubjectStat::from).collect())
    }
}
