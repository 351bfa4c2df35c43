//! Administration records: blocked IPs and background tasks.

use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A blocked IP entry as returned by the block-list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockedIp {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub blocked_at: Option<String>,
}

impl BlockedIp {
    /// Decode a blocked-IP entry from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("blocked ip decode: {e}")))
    }
}

/// Result of an on-demand background task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundTaskRun {
    pub task_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_ip_decode() {
        let value = serde_json::json!({
            "ip": "203.0.113.9",
            "reason": "suspicious activity"
        });
        let entry = BlockedIp::from_value(value).unwrap();
        assert_eq!(entry.ip, "203.0.113.9");
        assert!(entry.blocked_at.is_none());
    }
}
