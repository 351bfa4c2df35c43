//! User profile and auth session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A user profile as returned by the profile and list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub joined_servers_ids: Vec<String>,
    #[serde(default)]
    pub conversations: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Decode a profile from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("user profile decode: {e}")))
    }

    /// The last-seen timestamp parsed as a datetime, when present and valid.
    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen.as_deref().and_then(crate::parse_timestamp)
    }
}

/// Auth session returned by sign-in, sign-up, and reset-auth-token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub auth_token: String,
    #[serde(default)]
    pub auth_token_expire_time: Option<String>,
}

impl AuthSession {
    /// The token expiry parsed as a datetime, when present and valid.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.auth_token_expire_time
            .as_deref()
            .and_then(crate::parse_timestamp)
    }
}
