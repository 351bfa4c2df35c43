//! PufferBlow Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other SDK crates:
//! - Client options (server endpoint, credentials, timeouts)
//! - Unified error type covering every error category the server surfaces
//! - Structured logging with tracing
//! - Common constants (API version, recognized status values, storage directories)

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

// Re-export commonly used items at the crate root
pub use config::ClientOptions;
pub use error::{PbError, PbResult};
pub use logging::init_logging;
