use thiserror::Error;

use crate::core::types::SpeciesId;
use crate::hex::HexKey;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("World generation produced no height-0 tile for seed {seed}")]
    DegenerateWorld { seed: u64 },

    #[error("Tile not found: {0}")]
    TileNotFound(HexKey),

    #[error("Species not found: {0}")]
    SpeciesNotFound(SpeciesId),

    #[error("Game result received without an active population attempt")]
    NoActiveAttempt,

    #[error("Invalid save document: {0}")]
    InvalidSave(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
