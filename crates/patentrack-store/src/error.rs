use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(std::path::PathBuf),

    #[error("no patent with id {0}")]
    PatentNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
