use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profiles::domain::inout::DescribeSessionOutput;
use crate::profiles::domain::profile::ProfileRecord;

// ╔════════════════════════════╗
// ║    OAuth callback          ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
}

// ╔════════════════════════════╗
// ║    Profiles                ║
// ╚════════════════════════════╝

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRecord> for ProfileResponse {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            avatar_url: record.avatar_url,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct MyProfileResponse {
    pub profile: ProfileResponse,
    pub provider: String,
}

#[derive(Serialize)]
pub struct SyncProfileResponse {
    pub success: bool,
    pub provider: String,
}

#[derive(Serialize)]
pub struct HomeResponse {
    pub message: String,
    pub recent_profiles: Vec<ProfileResponse>,
}

// ╔════════════════════════════╗
// ║    Session debug           ║
// ╚════════════════════════════╝

#[derive(Serialize)]
pub struct SessionStateResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl From<DescribeSessionOutput> for SessionStateResponse {
    fn from(output: DescribeSessionOutput) -> Self {
        Self {
            authenticated: output.authenticated,
            user_id: output.user_id,
            email: output.email,
            provider: output.provider,
            expires_at: output.expires_at,
        }
    }
}
