//! Integration tests for the overworld game loop
//!
//! These tests drive the pure reducer through whole turns on generated maps:
//! - Tutorial settlement, loss and retry
//! - Migration between neighboring tiles and fog-of-war reveal
//! - Epoch advance refreshing action points, gene pools and gene offers

use clade_overworld::core::config::{GameConfig, WorldConfig};
use clade_overworld::core::types::SpeciesId;
use clade_overworld::hex::{HexKey, NEIGHBOR_OFFSETS};
use clade_overworld::level::GameResult;
use clade_overworld::overworld::{generate_rectangle, WorldGenerator};
use clade_overworld::state::{Action, AppState, PopulationAttempt, Reducer};

/// Noise switched off: every tile is height 0, the start tile is the origin
fn flat_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.world = WorldConfig {
        seed: 7,
        width: 8.0,
        height: 6.0,
        base_height: 0.0,
        large_scale_amplitude: 0.0,
        medium_scale_amplitude: 0.0,
        small_scale_amplitude: 0.0,
        latitude_falloff: 0.0,
        ..WorldConfig::default()
    };
    config.session.strict_game_results = true;
    config
}

fn dispatch(reducer: &Reducer, state: AppState, action: Action) -> AppState {
    reducer.reduce(&state, action).expect("reducer failed")
}

// ============================================================================
// Generation
// ============================================================================

#[test]
fn test_same_seed_same_rectangle() {
    let seed = (0..64)
        .find(|&seed| generate_rectangle(seed, 8.0, 4.0).is_ok())
        .expect("every seed produced a world without shore");

    let a = generate_rectangle(seed, 8.0, 4.0).expect("first run failed");
    let b = generate_rectangle(seed, 8.0, 4.0).expect("second run failed");
    let cells = |w: &clade_overworld::overworld::OverWorld| {
        w.tiles()
            .iter()
            .map(|(k, t)| (k, t.info.height))
            .collect::<Vec<_>>()
    };
    assert!(!cells(&a).is_empty());
    assert_eq!(cells(&a), cells(&b));
    assert_eq!(a.start_key(), b.start_key());
    assert_eq!(a.start_tile().info.height, 0);

    let gen = WorldGenerator::default();
    assert_eq!(gen.generate_tiles(seed, 8.0, 4.0), gen.generate_tiles(seed, 8.0, 4.0));
}

#[test]
fn test_flat_world_starts_at_origin() {
    let state = AppState::initial(&flat_config()).unwrap();
    let world = &state.over_world;

    assert_eq!(world.start_key(), HexKey::new(0, 0));
    assert!(world.start_tile().info.visible);
    assert_eq!(world.tiles().values().filter(|t| t.info.visible).count(), 1);

    let attempt = state.active_population_attempt.as_ref().unwrap();
    assert!(attempt.is_tutorial());
    assert_eq!(attempt.target, world.start_key());
    assert_eq!(attempt.species, state.lineage.root_id());
}

// ============================================================================
// Full turn
// ============================================================================

#[test]
fn test_tutorial_then_migration_turn() {
    let config = flat_config();
    let reducer = Reducer::new(&config);
    let mut state = AppState::initial(&config).unwrap();
    let root = state.lineage.root_id();
    let origin = HexKey::new(0, 0);

    // Lose the first level: the attempt comes back
    state = dispatch(&reducer, state, Action::GetGameResult(GameResult::lost()));
    state = dispatch(&reducer, state, Action::GameResultDone);
    assert!(state.active_population_attempt.as_ref().unwrap().is_tutorial());
    assert_eq!(state.over_world.occupied_tiles().count(), 0);

    // Win it
    state = dispatch(&reducer, state, Action::GetGameResult(GameResult::won(2)));
    let level_request = state.level_request().unwrap();
    assert_eq!(level_request.coord.i, 0);
    state = dispatch(&reducer, state, Action::GameResultDone);
    assert!(state.active_population_attempt.is_none());

    let visible = state.over_world.tiles().values().filter(|t| t.info.visible).count();
    assert_eq!(visible, 7);

    // Settled tiles have no move until the epoch turns
    assert!(state.over_world.unused_hexes().is_empty());
    state = dispatch(&reducer, state, Action::NextEpoch);
    assert_eq!(state.epoch, 1);
    assert_eq!(state.over_world.unused_hexes().len(), 1);
    assert_eq!(state.lineage.root().free_mutation_points, 2);
    assert!(!state.lineage.root().gene_choices.is_empty());

    // Every neighbor of the origin is a valid target
    let origin_tile = state.over_world.get(origin).unwrap();
    assert_eq!(state.over_world.possible_migration_targets(origin_tile).len(), 6);

    let (di, dj) = NEIGHBOR_OFFSETS[0];
    let target = HexKey::new(di, dj);
    let attempt = PopulationAttempt::new(Some(origin), target, root);
    state = dispatch(&reducer, state, Action::StartPopulationAttempt(attempt));
    state = dispatch(&reducer, state, Action::GetGameResult(GameResult::won(3)));
    state = dispatch(&reducer, state, Action::GameResultDone);

    assert_eq!(state.over_world.get_max_gene_pool(root), 5);
    assert_eq!(state.lineage.root().total_mutation_points, 5);
    assert!(state.over_world.unused_hexes().is_empty());
    let origin_tile = state.over_world.get(origin).unwrap();
    assert!(state.over_world.possible_migration_targets(origin_tile).is_empty());
}

#[test]
fn test_invisible_target_leaves_state_untouched() {
    let config = flat_config();
    let reducer = Reducer::new(&config);
    let state = AppState::initial(&config).unwrap();

    let far = state
        .over_world
        .tiles()
        .values()
        .find(|t| !t.info.visible)
        .map(|t| t.key())
        .unwrap();
    let attempt = PopulationAttempt::new(None, far, state.lineage.root_id());
    let next = reducer.reduce(&state, Action::StartPopulationAttempt(attempt)).unwrap();
    assert_eq!(next, state);
}

#[test]
fn test_speciation_and_gene_purchase_persist_through_epochs() {
    let config = flat_config();
    let reducer = Reducer::new(&config);
    let mut state = AppState::initial(&config).unwrap();
    let root = state.lineage.root_id();

    state = dispatch(&reducer, state, Action::GetGameResult(GameResult::won(4)));
    state = dispatch(&reducer, state, Action::GameResultDone);
    state = dispatch(&reducer, state, Action::NextEpoch);

    let gene = state.lineage.root().gene_choices[0].gene.clone();
    state = dispatch(&reducer, state, Action::AcquireGene { species: root, gene: gene.clone() });
    state = dispatch(
        &reducer,
        state,
        Action::Speciate {
            parent: root,
            name: "Mossling".into(),
        },
    );

    let child = SpeciesId(2);
    let child_node = state.lineage.get(child).unwrap();
    assert_eq!(child_node.parent, Some(root));
    assert!(child_node.genome.contains(&gene));
    assert_eq!(state.lineage.pre_order(), vec![root, child]);

    // A landless species has an empty pool after the next epoch
    state = dispatch(&reducer, state, Action::NextEpoch);
    assert_eq!(state.lineage.get(child).unwrap().free_mutation_points, 0);
    assert_eq!(state.lineage.root().free_mutation_points, 4);
}
