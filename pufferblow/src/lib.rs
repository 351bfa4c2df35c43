//! PufferBlow - Rust SDK for the PufferBlow chat server.
//!
//! The [`Client`] facade owns the session (endpoint, credentials, auth
//! token) and hands out sub-clients for each endpoint group plus real-time
//! workers for the global and channel-scoped feeds. Privileged sub-clients
//! (admin, storage, federation, decentralized auth, real-time) can only be
//! constructed after signing in.
//!
//! ```no_run
//! use pufferblow::{Client, ClientOptions, WsCallbacks};
//!
//! # async fn run() -> pufferblow::PbResult<()> {
//! let mut client = Client::new(ClientOptions::new("user1", "12345678"));
//! client.sign_in().await?;
//!
//! let channels = client.channels()?.list_channels().await?;
//! let worker = client.global_ws(
//!     WsCallbacks::new().on_message(|event| println!("{event:?}")),
//!     None,
//! )?;
//! worker.connect();
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::Client;

// Foundation
pub use pb_core::config::ClientOptions;
pub use pb_core::constants;
pub use pb_core::error::{PbError, PbResult};
pub use pb_core::logging;

// Records
pub use pb_models::{
    AuthSession, BackgroundTaskRun, BlockedIp, Channel, DirectMessage, Message, NodeChallenge,
    NodeSession, StorageFile, UserProfile,
};

// Resource clients
pub use pb_api::{
    AdminClient, ApiClient, ChannelsClient, DecentralizedAuthClient, FederationClient,
    StorageClient, SystemClient, UsersClient,
};

// Real-time worker
pub use pb_socket::{
    ChatMessageEvent, ConnectionState, ErrorEvent, ReadConfirmation, ReadConfirmationAckEvent,
    Scope, WsCallbacks, WsConfig, WsEvent, WsWorker,
};
