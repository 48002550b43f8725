pub mod config;
pub mod error;
pub mod types;

pub use config::{GameConfig, GeneOfferPolicy, SessionConfig, WorldConfig};
pub use error::{GameError, Result};
pub use types::{Epoch, MutationPoints, SpeciesId, TileId};
