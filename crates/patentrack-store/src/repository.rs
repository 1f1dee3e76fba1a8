use async_trait::async_trait;
use patentrack_core::{Employee, Patent};

/// Partial update: column name → new value.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Where patent snapshots come from and where field edits go.
///
/// The core never calls `update_patent`; callers write, then fetch a fresh
/// snapshot and recompute.
#[async_trait]
pub trait PatentRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All patents, with `inventors` and `fer_entries` embedded.
    async fn fetch_patents(&self) -> Result<Vec<Patent>, Self::Error>;

    async fn fetch_employees(&self) -> Result<Vec<Employee>, Self::Error>;

    async fn update_patent(&self, id: &str, fields: FieldMap) -> Result<(), Self::Error>;
}
