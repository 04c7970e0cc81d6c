//! Database row models and their conversions into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::profiles::domain::profile::ProfileRecord;

#[derive(Debug, FromRow)]
pub struct ProfileModel {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileModel> for ProfileRecord {
    fn from(model: ProfileModel) -> Self {
        ProfileRecord {
            id: model.id,
            name: model.name,
            email: model.email,
            avatar_url: model.avatar_url,
            updated_at: model.updated_at,
        }
    }
}
