use thiserror::Error;

use crate::normalizer::ValidationError;
use crate::sync::SyncAborted;

#[derive(Error, Debug)]
pub enum NewswireError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Article URL already stored: {0}")]
    DuplicateUrl(String),

    #[error(transparent)]
    Sync(#[from] SyncAborted),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NewswireError>;
