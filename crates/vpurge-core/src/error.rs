use crate::types::ResourceKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("failed to list {kind}: status code {status}")]
    Fetch { kind: ResourceKind, status: u16 },

    #[error("malformed {kind} listing: {reason}")]
    MalformedListing { kind: ResourceKind, reason: String },

    #[error("config not found at {0}: run 'vpurge init'")]
    ConfigNotFound(PathBuf),

    #[error("invalid resource kind '{0}': expected users, persons, or plates")]
    InvalidKind(String),

    #[error("invalid session header: {0}")]
    InvalidHeader(String),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PurgeError>;
