//! Storage layer: the repository seam over the hosted database, and a local
//! JSON snapshot that mirrors it.

mod error;
mod repository;
mod snapshot;

pub use error::StoreError;
pub use repository::{FieldMap, PatentRepository};
pub use snapshot::SnapshotStore;
