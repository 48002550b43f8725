//! Boundary contracts with the level simulation
//!
//! The overworld produces a `LevelRequest` when a population attempt starts
//! and consumes a `GameResult` when the level ends.

pub mod info;
pub mod result;

pub use info::{Climate, Environment, Flora, LevelInfo, MAX_HEIGHT, MIN_HEIGHT};
pub use result::{GameResult, GameStatus, LevelRequest};
