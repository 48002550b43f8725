//! AppState - the single document the reducer produces

use std::sync::Arc;

use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::Epoch;
use crate::level::{Environment, GameResult, LevelRequest};
use crate::overworld::{OverWorld, WorldGenerator};
use crate::species::Lineage;
use crate::state::action::{Action, PopulationAttempt};

/// Name given to the root species of a new game
pub const ROOT_SPECIES_NAME: &str = "Protocell";

/// An action held back until its transition finishes
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    pub action: Box<Action>,
    /// Clock time (ms) at which `TransitionEnd` is due
    pub deadline_ms: u64,
}

/// Complete game state.
///
/// The overworld and lineage sit behind `Arc`s: cloning a state is cheap and
/// edits go through `Draft`, which copies a part only when it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub over_world: Arc<OverWorld>,
    pub lineage: Arc<Lineage>,
    pub epoch: Epoch,
    /// World seed, reused for gene draws
    pub seed: u64,
    pub active_population_attempt: Option<PopulationAttempt>,
    pub active_game_result: Option<GameResult>,
    pub transition: Option<PendingTransition>,
}

impl AppState {
    pub fn new(over_world: OverWorld, lineage: Lineage, seed: u64) -> Self {
        Self {
            over_world: Arc::new(over_world),
            lineage: Arc::new(lineage),
            epoch: 0,
            seed,
            active_population_attempt: None,
            active_game_result: None,
            transition: None,
        }
    }

    /// Fresh game: generated world, a lone root species and the tutorial
    /// attempt on the start tile
    pub fn initial(config: &GameConfig) -> Result<Self> {
        let over_world = WorldGenerator::new(config.world.clone()).generate_from_config()?;
        let lineage = Lineage::new(ROOT_SPECIES_NAME);

        let tutorial = PopulationAttempt::new(None, over_world.start_key(), lineage.root_id());
        let mut state = Self::new(over_world, lineage, config.world.seed);
        state.active_population_attempt = Some(tutorial);

        tracing::info!(
            seed = config.world.seed,
            tiles = state.over_world.tile_count(),
            "started new game"
        );
        Ok(state)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// What the level simulation needs to run the active attempt
    pub fn level_request(&self) -> Option<LevelRequest> {
        let attempt = self.active_population_attempt.as_ref()?;
        let tile = self.over_world.get(attempt.target)?;
        let species = self.lineage.get(attempt.species)?;

        Some(LevelRequest {
            coord: tile.coord,
            info: tile.info.clone(),
            environment: tile
                .info
                .environment
                .unwrap_or_else(|| Environment::for_height(tile.info.height)),
            species: species.id,
            genome: species.genome.clone(),
        })
    }
}
