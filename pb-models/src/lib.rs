//! PufferBlow Models - Typed records decoded from server JSON.
//!
//! Every record is decoded field by field with defaults for absent keys and
//! a hard decode error on type mismatches. Unknown extra fields sent by the
//! server are ignored, never copied into the records.

pub mod admin;
pub mod auth;
pub mod channel;
pub mod federation;
pub mod message;
pub mod storage;
pub mod user;

pub use admin::{BackgroundTaskRun, BlockedIp};
pub use auth::{NodeChallenge, NodeSession};
pub use channel::Channel;
pub use federation::DirectMessage;
pub use message::Message;
pub use storage::StorageFile;
pub use user::{AuthSession, UserProfile};

/// Parse a server-rendered timestamp string into a chrono datetime.
///
/// The server renders RFC 3339 timestamps; older builds omit the offset,
/// which is treated as UTC. Returns None for anything unparsable.
pub(crate) fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::{DateTime, NaiveDateTime, Utc};

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
