//! Login audit trail. Append-only: update and delete are rejected.

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use common::AppResult;
use domain::{LoginRecord, LoginStatus, NewLoginRecord, ENTITY_LOGIN_RECORDS};

use super::base::{EntityConfig, EntityQuery, Repository};
use crate::store::{Filter, SortSpec, TableSpec};

pub type LoginRecordRepository = Repository<LoginRecord>;

pub fn config() -> EntityConfig {
    EntityConfig::new(ENTITY_LOGIN_RECORDS, SortSpec::desc("login_time")).append_only()
}

pub fn table() -> TableSpec {
    TableSpec::new(ENTITY_LOGIN_RECORDS).required(&[
        "user_id",
        "ip_address",
        "user_agent",
        "login_time",
        "status",
    ])
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginRecordQuery {
    pub user_id: Option<Uuid>,
}

impl EntityQuery for LoginRecordQuery {
    fn filter(&self) -> Filter {
        Filter::new().eq_id_opt("user_id", self.user_id)
    }
}

impl Repository<LoginRecord> {
    /// Append a login attempt stamped with the current time.
    pub async fn record_login(
        &self,
        user_id: Uuid,
        ip_address: String,
        user_agent: String,
        status: LoginStatus,
    ) -> AppResult<LoginRecord> {
        self.create(&NewLoginRecord::now(user_id, ip_address, user_agent, status))
            .await
    }
}
