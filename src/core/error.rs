use thiserror::Error;

use crate::core::types::Cell;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Invalid facing: {0}")]
    InvalidFacing(String),

    #[error("Invalid tile: {0}")]
    InvalidTile(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Path from {start} to {target} could not be reconstructed")]
    PathReconstruction { start: Cell, target: Cell },

    #[error("Route step {step} is not adjacent to {from}")]
    NonAdjacentStep { from: Cell, step: Cell },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
