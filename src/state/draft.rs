//! Copy-on-write draft of an `AppState`
//!
//! A draft starts as a shallow copy of the previous snapshot. The overworld
//! or lineage is deep-copied only on first mutable access, so whoever still
//! holds the previous state keeps seeing it unchanged.

use std::sync::Arc;

use crate::core::types::Epoch;
use crate::level::GameResult;
use crate::overworld::OverWorld;
use crate::species::Lineage;
use crate::state::app_state::{AppState, PendingTransition};
use crate::state::action::PopulationAttempt;

pub struct Draft {
    state: AppState,
}

impl Draft {
    pub fn new(base: &AppState) -> Self {
        Self {
            state: base.clone(),
        }
    }

    pub fn world_mut(&mut self) -> &mut OverWorld {
        Arc::make_mut(&mut self.state.over_world)
    }

    pub fn lineage_mut(&mut self) -> &mut Lineage {
        Arc::make_mut(&mut self.state.lineage)
    }

    /// Both halves at once, for updates that read one while writing the other
    pub fn world_and_lineage_mut(&mut self) -> (&OverWorld, &mut Lineage) {
        let AppState {
            over_world,
            lineage,
            ..
        } = &mut self.state;
        (&**over_world, Arc::make_mut(lineage))
    }

    pub fn epoch(&self) -> Epoch {
        self.state.epoch
    }

    pub fn advance_epoch(&mut self) {
        self.state.epoch += 1;
    }

    pub fn attempt(&self) -> Option<&PopulationAttempt> {
        self.state.active_population_attempt.as_ref()
    }

    pub fn set_attempt(&mut self, attempt: Option<PopulationAttempt>) {
        self.state.active_population_attempt = attempt;
    }

    pub fn set_result(&mut self, result: Option<GameResult>) {
        self.state.active_game_result = result;
    }

    pub fn set_transition(&mut self, transition: Option<PendingTransition>) {
        self.state.transition = transition;
    }

    /// Materialize the edits into a new snapshot
    pub fn commit(self) -> AppState {
        self.state
    }
}
