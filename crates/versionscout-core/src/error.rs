use thiserror::Error;

/// All the ways a report can fail to materialise
///
/// Remote hiccups for a single repository never show up here; the provider
/// swallows those and hands back less data instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid GitHub username format: {0:?}")]
    InvalidUsername(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
