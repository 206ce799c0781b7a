pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod expiry;
pub mod inventory;
pub mod naming;
pub mod pacing;
pub mod provider;
pub mod rotation;

pub use error::{BackupError, RemoteError, Result};
