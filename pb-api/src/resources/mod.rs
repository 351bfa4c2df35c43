//! Resource clients organized by endpoint group.
//!
//! Each client wraps a fixed set of server endpoints, translating method
//! calls into requests and responses into typed records or typed errors.

pub mod admin;
pub mod channels;
pub mod decentralized_auth;
pub mod federation;
pub mod storage;
pub mod system;
pub mod users;

pub use admin::AdminClient;
pub use channels::ChannelsClient;
pub use decentralized_auth::DecentralizedAuthClient;
pub use federation::FederationClient;
pub use storage::StorageClient;
pub use system::SystemClient;
pub use users::UsersClient;
