//! Sync layer: REST access to the hosted database that owns the patent rows.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{RestClient, SyncError};
