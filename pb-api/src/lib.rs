//! PufferBlow API - HTTP client for the server REST API.
//!
//! This crate provides the HTTP transport plus one thin resource client per
//! endpoint group: users, channels, admin, storage, system, federation, and
//! decentralized auth. Every operation issues a single request and maps the
//! response to a typed record or a typed error; nothing is retried here.

pub mod client;
pub mod resources;

// Re-export key types
pub use client::ApiClient;
pub use resources::{
    AdminClient, ChannelsClient, DecentralizedAuthClient, FederationClient, StorageClient,
    SystemClient, UsersClient,
};
