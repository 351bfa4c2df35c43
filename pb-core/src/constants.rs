//! SDK-wide constants.

/// SDK name.
pub const SDK_NAME: &str = "pufferblow-rs";

/// SDK version.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// REST API version prefix.
pub const API_VERSION: &str = "v1";

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 7575;

/// Default API request timeout in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Extended timeout multiplier for uploads and raw file downloads.
pub const EXTENDED_TIMEOUT_MULTIPLIER: u64 = 12;

/// Default cap on WebSocket reconnection attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay before the first WebSocket reconnection attempt, in seconds.
pub const DEFAULT_RECONNECT_DELAY_SECS: f64 = 1.0;

/// Cap on the exponential reconnection backoff, in seconds.
pub const MAX_RECONNECT_DELAY_SECS: f64 = 30.0;

/// Default page size when loading channel messages or direct messages.
pub const DEFAULT_MESSAGES_PER_PAGE: u32 = 20;

/// Largest page size the server accepts when loading messages.
pub const MAX_MESSAGES_PER_PAGE: u32 = 100;

/// Largest number of log lines the server returns per request.
pub const MAX_LOG_LINES: u32 = 1000;

/// User status values recognized by the server.
pub mod user_status {
    pub const ONLINE: &str = "online";
    pub const OFFLINE: &str = "offline";

    /// All recognized status values. The server is authoritative; the SDK
    /// rejects values outside this set before issuing a request.
    pub const ALL: &[&str] = &[ONLINE, OFFLINE];
}

/// Storage directories the server accepts for uploads.
pub mod storage_directory {
    pub const UPLOADS: &str = "uploads";
    pub const AVATARS: &str = "avatars";
    pub const BANNERS: &str = "banners";
    pub const ATTACHMENTS: &str = "attachments";
    pub const STICKERS: &str = "stickers";
    pub const GIFS: &str = "gifs";

    /// All upload directories the server accepts.
    pub const ALL: &[&str] = &[UPLOADS, AVATARS, BANNERS, ATTACHMENTS, STICKERS, GIFS];
}

/// Server settings fields accepted by the update-server-info endpoint.
pub const SERVER_INFO_FIELDS: &[&str] = &[
    "server_name",
    "server_description",
    "is_private",
    "max_users",
    "max_message_length",
    "max_image_size",
    "max_video_size",
    "max_sticker_size",
    "max_gif_size",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_status_values() {
        assert!(user_status::ALL.contains(&"online"));
        assert!(user_status::ALL.contains(&"offline"));
    }

    #[test]
    fn test_storage_directories() {
        assert_eq!(storage_directory::ALL.len(), 6);
        assert!(storage_directory::ALL.contains(&"avatars"));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(DEFAULT_MESSAGES_PER_PAGE <= MAX_MESSAGES_PER_PAGE);
    }
}
