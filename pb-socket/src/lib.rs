//! PufferBlow Socket - real-time WebSocket client.
//!
//! This crate provides the connection worker that handles:
//! - One persistent socket per subscription scope (global feed or a single
//!   channel's feed)
//! - Automatic reconnection with exponential backoff up to a configured cap
//! - Dispatch of inbound events to user-supplied callbacks
//! - Best-effort, non-blocking read-confirmation sends from any thread
//!
//! Malformed inbound frames are dropped silently; connection failures are
//! retried locally and only surface through the callbacks.

pub mod events;
pub mod worker;

// Re-export key types
pub use events::{
    ChatMessageEvent, ConnectionState, ErrorEvent, ReadConfirmation, ReadConfirmationAckEvent,
    WsCallbacks, WsEvent,
};
pub use worker::{Scope, WsConfig, WsWorker};
