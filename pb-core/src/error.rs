//! Global error types for the PufferBlow SDK.
//!
//! Every error category the server can surface is unified into a single
//! `PbError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using PbError.
pub type PbResult<T> = Result<T, PbError>;

/// Unified error type covering all error categories in the SDK.
#[derive(Error, Debug)]
pub enum PbError {
    // -- Authentication errors --
    /// The username is not associated with any account.
    #[error("username not found: {0}")]
    UsernameNotFound(String),

    /// The password does not match the account.
    #[error("invalid password")]
    InvalidPassword,

    /// The auth token is malformed or rejected by the server.
    #[error("bad auth token: {0}")]
    BadAuthToken(String),

    /// A privileged sub-client was requested before signing in.
    #[error("not signed in: {0}")]
    NotSignedIn(String),

    // -- Not-found errors --
    /// No user with the given id.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// No channel with the given id.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// No message with the given id.
    #[error("message not found: {0}")]
    MessageNotFound(String),

    /// No file at the given url/path.
    #[error("file not found: {0}")]
    FileNotFound(String),

    // -- Conflict errors --
    /// The username is already taken.
    #[error("username already exists: {0}")]
    UsernameAlreadyExists(String),

    /// A channel with the same name already exists.
    #[error("channel already exists: {0}")]
    ChannelAlreadyExists(String),

    // -- Permission errors --
    /// The operation requires admin or server-owner privileges.
    #[error("access forbidden: {0}")]
    NotAdminOrOwner(String),

    /// An IP block-list or background-task operation was rejected.
    #[error("ip security error: {0}")]
    IpSecurity(String),

    // -- Validation errors --
    /// The status value is not one the server recognizes.
    #[error("invalid status value: {0}")]
    InvalidStatusValue(String),

    /// The message body exceeds the server's length limit.
    #[error("message too long: {0}")]
    MessageTooLong(String),

    /// The requested page size exceeds the server's limit.
    #[error("exceeded page size: requested {requested}, max {max}")]
    ExceededPageSize {
        /// Requested page size.
        requested: u32,
        /// Largest page size the server accepts.
        max: u32,
    },

    /// The upload directory is not one the server accepts.
    #[error("invalid storage directory: {0}")]
    InvalidDirectory(String),

    /// A request value failed client-side validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    // -- Network errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// WebSocket connection error.
    #[error("socket error: {0}")]
    Socket(String),

    /// Server returned an error response with no more specific mapping.
    #[error("server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error detail from the server.
        message: String,
    },

    // -- File/IO errors --
    /// File system operation failed (e.g. reading a file for upload).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Configuration errors --
    /// Failed to load or parse client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // -- Generic --
    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for PbError {
    fn from(e: serde_json::Error) -> Self {
        PbError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for PbError {
    fn from(e: toml::de::Error) -> Self {
        PbError::Config(e.to_string())
    }
}

impl PbError {
    /// Whether this error came from the authentication layer.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::UsernameNotFound(_)
                | Self::InvalidPassword
                | Self::BadAuthToken(_)
                | Self::NotSignedIn(_)
        )
    }

    /// Whether this error is a not-found kind.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::MessageNotFound(_)
                | Self::FileNotFound(_)
        )
    }
}
