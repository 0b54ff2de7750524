use thiserror::Error;

use crate::model::Embedding;

#[derive(Debug, Error)]
pub enum Error {
    #[error("track not found: {id}")]
    TrackNotFound { id: String },

    #[error("track {id} has no {embedding} embedding")]
    MissingEmbedding { id: String, embedding: Embedding },

    #[error("unsupported query: {0}")]
    Unsupported(String),

    #[error("unknown direction label: {0}")]
    UnknownDirection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("calibration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
