//! Per-tile level description and flora

use serde::{Deserialize, Serialize};

use crate::core::types::{MutationPoints, SpeciesId};

/// Lowest possible height; uninhabitable deep water
pub const MIN_HEIGHT: i8 = -1;

/// Highest possible height
pub const MAX_HEIGHT: i8 = 6;

/// Coarse environment preset handed to the level simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Water and shoreline (height -1..=0)
    Shallows,
    /// Low ground (height 1..=3)
    Lowlands,
    /// High ground (height 4..=6)
    Highlands,
}

impl Environment {
    /// Map a height band to its preset
    pub fn for_height(height: i8) -> Self {
        match height {
            h if h <= 0 => Self::Shallows,
            1..=3 => Self::Lowlands,
            _ => Self::Highlands,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Shallows => "shallows",
            Self::Lowlands => "lowlands",
            Self::Highlands => "highlands",
        }
    }
}

/// Optional climate descriptors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    /// 0.0 (polar) to 1.0 (equatorial)
    pub temperature: f64,
    /// 0.0 (arid) to 1.0 (wet)
    pub humidity: f64,
}

/// The species occupying a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flora {
    pub species: SpeciesId,
    pub mutation_points_per_epoch: MutationPoints,
    /// Either 0 or 1
    pub action_points: u8,
}

impl Flora {
    /// Freshly settled flora; it cannot act until the next epoch
    pub fn settled(species: SpeciesId, mutation_points_per_epoch: MutationPoints) -> Self {
        Self {
            species,
            mutation_points_per_epoch,
            action_points: 0,
        }
    }

    pub fn can_act(&self) -> bool {
        self.action_points > 0
    }

    pub fn spend_action_point(&mut self) {
        self.action_points = self.action_points.saturating_sub(1);
    }

    pub fn refresh_action_points(&mut self) {
        self.action_points = 1;
    }
}

/// Everything the overworld knows about a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// -1..=6, -1 is uninhabitable deep water
    pub height: i8,
    pub climate: Option<Climate>,
    /// Fog of war
    pub visible: bool,
    pub environment: Option<Environment>,
    pub flora: Option<Flora>,
}

impl LevelInfo {
    pub fn new(height: i8) -> Self {
        let height = height.clamp(MIN_HEIGHT, MAX_HEIGHT);
        Self {
            height,
            climate: None,
            visible: false,
            environment: Some(Environment::for_height(height)),
            flora: None,
        }
    }

    pub fn with_climate(mut self, climate: Climate) -> Self {
        self.climate = Some(climate);
        self
    }

    pub fn is_habitable(&self) -> bool {
        self.height > MIN_HEIGHT
    }

    pub fn occupant(&self) -> Option<SpeciesId> {
        self.flora.map(|f| f.species)
    }

    /// Flora that still has an action point this epoch
    pub fn active_flora(&self) -> Option<&Flora> {
        self.flora.as_ref().filter(|f| f.can_act())
    }
}
