//! Client configuration management.
//!
//! Holds the server endpoint and credentials used to build every sub-client,
//! with optional TOML persistence on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{PbError, PbResult};

/// Options for constructing a PufferBlow client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Server host (e.g. "127.0.0.1" or "chat.example.com").
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Account username.
    #[serde(default)]
    pub username: String,

    /// Account password.
    #[serde(default)]
    pub password: String,

    /// Use https/wss instead of http/ws.
    #[serde(default)]
    pub secure: bool,

    /// API request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,
}

fn default_host() -> String {
    constants::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    constants::DEFAULT_PORT
}

fn default_api_timeout() -> u64 {
    constants::DEFAULT_API_TIMEOUT_MS
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            secure: false,
            api_timeout_ms: default_api_timeout(),
        }
    }
}

impl ClientOptions {
    /// Create options for the given account on the default local endpoint.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set the server endpoint.
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Enable https/wss.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// The HTTP origin, scheme + host + port with no path.
    pub fn origin(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// The WebSocket origin, scheme + host + port with no path.
    pub fn ws_origin(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// The REST API root, origin + versioned base path.
    pub fn api_root(&self) -> String {
        format!("{}/api/{}", self.origin(), constants::API_VERSION)
    }

    /// Load options from a TOML file.
    pub fn load_from_file(path: &Path) -> PbResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let options: ClientOptions = toml::from_str(&contents)?;
        Ok(options)
    }

    /// Save options to a TOML file, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> PbResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PbError::Config(format!("failed to serialize options: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The default configuration file path under the user config directory.
    pub fn default_config_path() -> PbResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| PbError::Config("no user config directory".to_string()))?;
        Ok(base.join("pufferblow").join("client.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.host, "127.0.0.1");
        assert_eq!(options.port, 7575);
        assert!(!options.secure);
        assert_eq!(options.api_timeout_ms, 30_000);
    }

    #[test]
    fn test_origins() {
        let options = ClientOptions::new("user1", "12345678");
        assert_eq!(options.origin(), "http://127.0.0.1:7575");
        assert_eq!(options.ws_origin(), "ws://127.0.0.1:7575");
        assert_eq!(options.api_root(), "http://127.0.0.1:7575/api/v1");

        let options = options.with_endpoint("chat.example.com", 443).with_secure(true);
        assert_eq!(options.origin(), "https://chat.example.com:443");
        assert_eq!(options.ws_origin(), "wss://chat.example.com:443");
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");

        let options = ClientOptions::new("user1", "12345678").with_endpoint("10.0.0.2", 8000);
        options.save_to_file(&path).unwrap();

        let loaded = ClientOptions::load_from_file(&path).unwrap();
        assert_eq!(loaded.host, "10.0.0.2");
        assert_eq!(loaded.port, 8000);
        assert_eq!(loaded.username, "user1");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "username = \"user1\"\n").unwrap();

        let loaded = ClientOptions::load_from_file(&path).unwrap();
        assert_eq!(loaded.username, "user1");
        assert_eq!(loaded.port, 7575);
    }
}
