//! Core reducer - pure state transitions for the overworld
//!
//! Every transition builds its result on a `Draft` of the incoming state.
//! Invalid requests are soft-rejected: the input state comes back unchanged
//! and a warning is logged, because the UI is expected to have disabled the
//! triggering control already.

use std::sync::Arc;

use crate::core::config::{GameConfig, GeneOfferPolicy};
use crate::core::error::{GameError, Result};
use crate::core::types::{Epoch, SpeciesId};
use crate::level::{Flora, GameResult, GameStatus};
use crate::species::{GeneCatalog, StaticGeneCatalog};
use crate::state::action::{Action, PopulationAttempt};
use crate::state::app_state::AppState;
use crate::state::draft::Draft;

/// Pure `(state, action) -> state` function plus its fixed collaborators
#[derive(Clone)]
pub struct Reducer {
    catalog: Arc<dyn GeneCatalog>,
    gene_offer_policy: GeneOfferPolicy,
    strict_game_results: bool,
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer")
            .field("gene_offer_policy", &self.gene_offer_policy)
            .field("strict_game_results", &self.strict_game_results)
            .finish_non_exhaustive()
    }
}

impl Reducer {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            catalog: Arc::new(StaticGeneCatalog::with_defaults(config.world.gene_offer_size)),
            gene_offer_policy: config.world.gene_offer_policy,
            strict_game_results: config.session.strict_game_results,
        }
    }

    /// Swap in a different gene catalog
    pub fn with_catalog(mut self, catalog: Arc<dyn GeneCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_strict_game_results(mut self, strict: bool) -> Self {
        self.strict_game_results = strict;
        self
    }

    pub fn reduce(&self, state: &AppState, action: Action) -> Result<AppState> {
        match action {
            Action::StartPopulationAttempt(attempt) => self.start_population_attempt(state, attempt),
            Action::PopulationAttemptSuccess { attempt, result } => {
                self.population_attempt_success(state, &attempt, &result)
            }
            Action::GetGameResult(result) => self.get_game_result(state, result),
            Action::GameResultDone => Ok(self.game_result_done(state)),
            Action::NextEpoch => self.next_epoch(state),
            Action::AcquireGene { species, gene } => self.acquire_gene(state, species, &gene),
            Action::Speciate { parent, name } => self.speciate(state, parent, name),
            Action::TransitionStart(_) | Action::TransitionEnd => {
                tracing::debug!("transition action reached the core reducer; ignoring");
                Ok(state.clone())
            }
        }
    }

    fn start_population_attempt(&self, state: &AppState, attempt: PopulationAttempt) -> Result<AppState> {
        let Some(target) = state.over_world.get(attempt.target) else {
            return Ok(reject(state, "target tile does not exist", &attempt));
        };
        if !target.info.visible {
            return Ok(reject(state, "target tile is not visible", &attempt));
        }
        if !target.info.is_habitable() {
            return Ok(reject(state, "target tile is uninhabitable", &attempt));
        }
        if let Some(source) = attempt.source {
            let has_flora = state
                .over_world
                .get(source)
                .is_some_and(|tile| tile.info.flora.is_some());
            if !has_flora {
                return Ok(reject(state, "source tile has no flora", &attempt));
            }
        }
        if !state.lineage.contains(attempt.species) {
            return Ok(reject(state, "settling species is unknown", &attempt));
        }

        tracing::debug!(tile = %attempt.target, species = %attempt.species, "population attempt started");
        let mut draft = Draft::new(state);
        draft.set_attempt(Some(attempt));
        draft.set_result(None);
        Ok(draft.commit())
    }

    fn population_attempt_success(
        &self,
        state: &AppState,
        attempt: &PopulationAttempt,
        result: &GameResult,
    ) -> Result<AppState> {
        if state.over_world.get(attempt.target).is_none() {
            return Ok(reject(state, "target tile does not exist", attempt));
        }
        if !state.lineage.contains(attempt.species) {
            return Ok(reject(state, "settling species is unknown", attempt));
        }

        let mut draft = Draft::new(state);
        settle(&mut draft, attempt, result)?;
        Ok(draft.commit())
    }

    fn get_game_result(&self, state: &AppState, result: GameResult) -> Result<AppState> {
        let Some(attempt) = state.active_population_attempt.clone() else {
            if self.strict_game_results {
                return Err(GameError::NoActiveAttempt);
            }
            tracing::warn!(?result, "game result without an active attempt; ignoring");
            return Ok(state.clone());
        };

        let mut draft = Draft::new(state);
        if result.status == GameStatus::Won {
            settle(&mut draft, &attempt, &result)?;
        }
        draft.set_result(Some(result));

        tracing::info!(
            status = ?result.status,
            mutation_points = result.mutation_points_per_epoch,
            tile = %attempt.target,
            "level finished"
        );
        Ok(draft.commit())
    }

    fn game_result_done(&self, state: &AppState) -> AppState {
        let mut draft = Draft::new(state);

        // Only a lost first level is handed back for another try
        let retry = match state.active_game_result {
            Some(result) if !result.is_win() => draft.attempt().filter(|a| a.is_tutorial()).cloned(),
            _ => None,
        };

        if retry.is_some() {
            tracing::debug!("first level lost; reissuing the attempt");
        } else if state.active_game_result.is_none() && state.active_population_attempt.is_some() {
            tracing::debug!("attempt abandoned before its level finished");
        }
        draft.set_attempt(retry);
        draft.set_result(None);
        draft.commit()
    }

    fn next_epoch(&self, state: &AppState) -> Result<AppState> {
        let mut draft = Draft::new(state);
        let first_choice = draft.epoch() == 0;
        let offer_genes = first_choice || self.gene_offer_policy == GeneOfferPolicy::EveryEpoch;
        let epoch = draft.epoch();

        draft.world_mut().reset_action_points();

        let (world, lineage) = draft.world_and_lineage_mut();
        for id in lineage.pre_order() {
            let pool = world.get_max_gene_pool(id);
            let species = lineage.species_mut(id)?;
            species.free_mutation_points = pool;
            species.total_mutation_points = pool;

            if pool > 0 && offer_genes {
                let seed = gene_seed(state.seed, epoch, id);
                let offer = self.catalog.offer(species, first_choice, seed);
                species.gene_choices = offer;
            }
        }

        draft.advance_epoch();
        tracing::info!(epoch = draft.epoch(), "epoch advanced");
        Ok(draft.commit())
    }

    fn acquire_gene(&self, state: &AppState, species_id: SpeciesId, gene: &str) -> Result<AppState> {
        let Some(species) = state.lineage.get(species_id) else {
            tracing::warn!(species = %species_id, "rejected gene purchase: unknown species");
            return Ok(state.clone());
        };
        let Some(choice) = species.gene_choices.iter().find(|c| c.gene == gene) else {
            tracing::warn!(species = %species_id, gene, "rejected gene purchase: gene not on offer");
            return Ok(state.clone());
        };
        if choice.cost > species.free_mutation_points {
            tracing::warn!(
                species = %species_id,
                gene,
                cost = choice.cost,
                free = species.free_mutation_points,
                "rejected gene purchase: not enough mutation points"
            );
            return Ok(state.clone());
        }
        let cost = choice.cost;

        let mut draft = Draft::new(state);
        let species = draft.lineage_mut().species_mut(species_id)?;
        species.free_mutation_points -= cost;
        species.genome.add(gene);
        species.gene_choices.clear();
        Ok(draft.commit())
    }

    fn speciate(&self, state: &AppState, parent: SpeciesId, name: String) -> Result<AppState> {
        if !state.lineage.contains(parent) {
            tracing::warn!(parent = %parent, "rejected speciation: unknown parent");
            return Ok(state.clone());
        }
        let mut draft = Draft::new(state);
        draft.lineage_mut().add_descendant(parent, name)?;
        Ok(draft.commit())
    }
}

/// Apply a won level to the draft: spend the source's action point, take the
/// target, shrink the dislodged species' pool and lift the fog around it
fn settle(draft: &mut Draft, attempt: &PopulationAttempt, result: &GameResult) -> Result<()> {
    let world = draft.world_mut();

    if let Some(source) = attempt.source {
        if let Some(flora) = world.tile_mut(source)?.info.flora.as_mut() {
            flora.spend_action_point();
        }
    }

    let target = world.tile_mut(attempt.target)?;
    let previous = target.info.occupant();
    target.info.flora = Some(Flora::settled(attempt.species, result.mutation_points_per_epoch));
    target.info.visible = true;
    let revealed = world.reveal_neighbors(attempt.target);

    let (world, lineage) = draft.world_and_lineage_mut();

    if let Some(previous) = previous {
        let pool = world.get_max_gene_pool(previous);
        match lineage.get_mut(previous) {
            Some(loser) => {
                // Losing ground can shrink the free pool but never grow it
                loser.free_mutation_points = loser.free_mutation_points.min(pool);
                loser.total_mutation_points = pool;
            }
            None => tracing::warn!(species = %previous, "dislodged species is not in the lineage"),
        }
    }

    let settler_pool = world.get_max_gene_pool(attempt.species);
    lineage.species_mut(attempt.species)?.total_mutation_points = settler_pool;

    tracing::debug!(
        tile = %attempt.target,
        species = %attempt.species,
        dislodged = ?previous,
        revealed,
        "tile settled"
    );
    Ok(())
}

fn reject(state: &AppState, reason: &str, attempt: &PopulationAttempt) -> AppState {
    tracing::warn!(
        tile = %attempt.target,
        source = ?attempt.source,
        species = %attempt.species,
        "rejected population attempt: {}",
        reason
    );
    state.clone()
}

/// Per-species, per-epoch seed for gene draws
fn gene_seed(seed: u64, epoch: Epoch, species: SpeciesId) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ epoch.rotate_left(21)
        ^ (species.0 as u64).rotate_left(42)
}
