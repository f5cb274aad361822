//! Login audit trail. Records are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LoginStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub login_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_time: Option<DateTime<Utc>>,
    pub status: LoginStatus,
}

impl Record for LoginRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Row written when a login attempt is recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLoginRecord {
    pub user_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub login_time: DateTime<Utc>,
    pub status: LoginStatus,
}

impl NewLoginRecord {
    /// Stamp a login attempt with the current time.
    pub fn now(user_id: Uuid, ip_address: String, user_agent: String, status: LoginStatus) -> Self {
        Self {
            user_id,
            ip_address,
            user_agent,
            login_time: Utc::now(),
            status,
        }
    }
}
