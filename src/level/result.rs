//! Values exchanged with the level simulation

use serde::{Deserialize, Serialize};

use super::info::{Environment, LevelInfo};
use crate::core::types::{MutationPoints, SpeciesId};
use crate::hex::HexCoordinate;
use crate::species::Genome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Won,
    Lost,
}

/// Outcome reported by the level when it ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub status: GameStatus,
    pub mutation_points_per_epoch: MutationPoints,
}

impl GameResult {
    pub fn won(mutation_points_per_epoch: MutationPoints) -> Self {
        Self {
            status: GameStatus::Won,
            mutation_points_per_epoch,
        }
    }

    pub fn lost() -> Self {
        Self {
            status: GameStatus::Lost,
            mutation_points_per_epoch: 0,
        }
    }

    pub fn is_win(&self) -> bool {
        self.status == GameStatus::Won
    }
}

/// Everything the level needs to start a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRequest {
    pub coord: HexCoordinate,
    pub info: LevelInfo,
    pub environment: Environment,
    pub species: SpeciesId,
    pub genome: Genome,
}
