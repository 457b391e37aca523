use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Geometry Error: {0}")]
    Geometry(String),

    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
