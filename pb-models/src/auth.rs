//! Decentralized-auth records: node challenges and sessions.

use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A challenge issued to a node identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeChallenge {
    #[serde(default)]
    pub challenge_id: String,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl NodeChallenge {
    /// Decode a challenge from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("node challenge decode: {e}")))
    }
}

/// A node session issued after a verified challenge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSession {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl NodeSession {
    /// Decode a session from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("node session decode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_challenge_decode() {
        let value = serde_json::json!({
            "challenge_id": "ch-1",
            "challenge": "sign-me",
            "expires_at": "2024-06-01T00:00:00"
        });
        let challenge = NodeChallenge::from_value(value).unwrap();
        assert_eq!(challenge.challenge_id, "ch-1");
    }

    #[test]
    fn test_node_session_decode() {
        let value = serde_json::json!({
            "session_id": "s-1",
            "session_token": "tok",
            "active": true
        });
        let session = NodeSession::from_value(value).unwrap();
        assert!(session.active);
    }
}
