// PhotoVault error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoVaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("ExifTool error: {0}")]
    ExifTool(String),

    #[error("Checksum error: {0}")]
    Checksum(String),

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for PhotoVaultError {
    fn from(err: anyhow::Error) -> Self {
        PhotoVaultError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PhotoVaultError>;
