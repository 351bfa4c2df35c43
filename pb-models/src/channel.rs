//! Channel record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A channel as returned by the list/create/info endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub messages_ids: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Channel {
    /// Decode a channel from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("channel decode: {e}")))
    }

    /// The creation timestamp parsed as a datetime, when present and valid.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(crate::parse_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_decode() {
        let value = serde_json::json!({
            "channel_id": "c-1",
            "channel_name": "general",
            "is_private": false,
            "allowed_users": [],
            "created_at": "2024-05-01T10:30:00"
        });
        let channel = Channel::from_value(value).unwrap();
        assert_eq!(channel.channel_name, "general");
        assert!(!channel.is_private);
        assert!(channel.created_at_datetime().is_some());
    }

    #[test]
    fn test_channel_privacy_type_mismatch() {
        let value = serde_json::json!({
            "channel_id": "c-1",
            "is_private": "private"
        });
        assert!(Channel::from_value(value).is_err());
    }
}
