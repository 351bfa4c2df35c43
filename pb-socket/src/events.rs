//! Wire event types and the user callback set.
//!
//! Inbound frames are JSON objects with a `type` discriminator. Anything
//! that fails to decode is expected noise and gets dropped by the worker.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use pb_core::error::PbError;

/// Payload of a `chat_message` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    #[serde(default)]
    pub channel_id: Option<String>,
    pub message_id: String,
    #[serde(default)]
    pub sender_user_id: String,
    #[serde(default)]
    pub sender_username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub hashed_message: Option<String>,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Payload of an acknowledgement for a read confirmation we sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadConfirmationAckEvent {
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Payload of a server-side error report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    pub description: String,
}

/// An inbound real-time event, discriminated by the `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    /// A message was posted to a subscribed channel.
    ChatMessage(ChatMessageEvent),
    /// The server acknowledged a read confirmation.
    ReadConfirmationAck(ReadConfirmationAckEvent),
    /// The server reported an error on this subscription.
    Error(ErrorEvent),
}

/// The outbound read-confirmation control frame.
///
/// Serialized as `{"type":"read_confirmation","message_id":…,"channel_id"?:…}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename = "read_confirmation")]
pub struct ReadConfirmation {
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Connection state of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket, never started.
    Idle,
    /// Handshake in flight.
    Connecting,
    /// Handshake complete, receive loop active.
    Connected,
    /// Leaving the connected state after a close.
    Closing,
    /// Leaving the connected state after a failure.
    Failed,
    /// Worker exited; terminal until a fresh connect().
    Stopped,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Closing => write!(f, "closing"),
            Self::Failed => write!(f, "failed"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

type MessageHandler = Arc<dyn Fn(WsEvent) + Send + Sync>;
type ConnectedHandler = Arc<dyn Fn() + Send + Sync>;
type DisconnectedHandler = Arc<dyn Fn(&str) + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&PbError) + Send + Sync>;

/// User-supplied callbacks for a worker. Each is optional.
///
/// Callbacks run on the worker's task; keep them short and hand heavy work
/// off to your own channels.
#[derive(Clone, Default)]
pub struct WsCallbacks {
    on_message: Option<MessageHandler>,
    on_connected: Option<ConnectedHandler>,
    on_disconnected: Option<DisconnectedHandler>,
    on_error: Option<ErrorHandler>,
}

impl WsCallbacks {
    /// An empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every decoded inbound event, in arrival order.
    pub fn on_message(mut self, f: impl Fn(WsEvent) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Called once per successful handshake.
    pub fn on_connected(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connected = Some(Arc::new(f));
        self
    }

    /// Called exactly once per exit of the connected state, with a short
    /// reason string.
    pub fn on_disconnected(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_disconnected = Some(Arc::new(f));
        self
    }

    /// Called on every handshake or transport failure.
    pub fn on_error(mut self, f: impl Fn(&PbError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn emit_message(&self, event: WsEvent) {
        if let Some(f) = &self.on_message {
            f(event);
        }
    }

    pub(crate) fn emit_connected(&self) {
        if let Some(f) = &self.on_connected {
            f();
        }
    }

    pub(crate) fn emit_disconnected(&self, reason: &str) {
        if let Some(f) = &self.on_disconnected {
            f(reason);
        }
    }

    pub(crate) fn emit_error(&self, err: &PbError) {
        if let Some(f) = &self.on_error {
            f(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_decode() {
        let raw = r#"{
            "type": "chat_message",
            "channel_id": "c-1",
            "message_id": "m-1",
            "sender_user_id": "u-1",
            "sender_username": "user1",
            "message": "hello",
            "sent_at": "2024-05-01T10:30:00",
            "attachments": []
        }"#;
        let event: WsEvent = serde_json::from_str(raw).unwrap();
        match event {
            WsEvent::ChatMessage(msg) => {
                assert_eq!(msg.message_id, "m-1");
                assert_eq!(msg.sender_username.as_deref(), Some("user1"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_read_confirmation_ack_decode() {
        let raw = r#"{"type":"read_confirmation_ack","message_id":"m-1"}"#;
        let event: WsEvent = serde_json::from_str(raw).unwrap();
        assert!(matches!(event, WsEvent::ReadConfirmationAck(_)));
    }

    #[test]
    fn test_error_event_decode() {
        let raw = r#"{"type":"error","description":"subscription rejected"}"#;
        let event: WsEvent = serde_json::from_str(raw).unwrap();
        match event {
            WsEvent::Error(e) => assert_eq!(e.description, "subscription rejected"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_fails_decode() {
        let raw = r#"{"type":"presence_update","user_id":"u-1"}"#;
        assert!(serde_json::from_str::<WsEvent>(raw).is_err());
    }

    #[test]
    fn test_missing_type_fails_decode() {
        assert!(serde_json::from_str::<WsEvent>(r#"{"message_id":"m-1"}"#).is_err());
    }

    #[test]
    fn test_read_confirmation_wire_shape() {
        let frame = serde_json::to_value(ReadConfirmation {
            message_id: "m-1".to_string(),
            channel_id: None,
        })
        .unwrap();
        assert_eq!(
            frame,
            serde_json::json!({"type": "read_confirmation", "message_id": "m-1"})
        );

        let frame = serde_json::to_value(ReadConfirmation {
            message_id: "m-2".to_string(),
            channel_id: Some("c-1".to_string()),
        })
        .unwrap();
        assert_eq!(frame["channel_id"], "c-1");
    }

    #[test]
    fn test_callbacks_optional() {
        // Emitting with no handlers registered must be a no-op.
        let callbacks = WsCallbacks::new();
        callbacks.emit_connected();
        callbacks.emit_disconnected("test");
        callbacks.emit_error(&PbError::Socket("x".into()));
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Stopped.to_string(), "stopped");
    }
}
