//! Storage (CDN) file record.

use serde::{Deserialize, Serialize};

use pb_core::error::{PbError, PbResult};

/// A stored file as returned by the storage list/info endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageFile {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl StorageFile {
    /// Decode a file record from a server JSON value.
    pub fn from_value(value: serde_json::Value) -> PbResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PbError::Serialization(format!("storage file decode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_file_decode() {
        let value = serde_json::json!({
            "file_name": "avatar.png",
            "url": "http://127.0.0.1:7575/storage/avatars/avatar.png",
            "directory": "avatars",
            "size_bytes": 2048
        });
        let file = StorageFile::from_value(value).unwrap();
        assert_eq!(file.directory.as_deref(), Some("avatars"));
        assert_eq!(file.size_bytes, Some(2048));
    }
}
