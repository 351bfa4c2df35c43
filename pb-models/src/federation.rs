//! Federation and direct-message records.

use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A direct message exchanged with a local user or remote handle/actor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub peer: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl DirectMessage {
    /// Decode a direct message from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("direct message decode: {e}")))
    }
}
