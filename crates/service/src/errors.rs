use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),
}
