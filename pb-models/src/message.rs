//! Channel message record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A message as returned by load-messages and send-message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub hashed_message: Option<String>,
    #[serde(default)]
    pub sender_user_id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Message {
    /// Decode a message from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("message decode: {e}")))
    }

    /// The sent timestamp parsed as a datetime, when present and valid.
    pub fn sent_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.sent_at.as_deref().and_then(crate::parse_timestamp)
    }
}
