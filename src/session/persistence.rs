//! Save documents and the persistence gateway
//!
//! A save holds the overworld, the lineage, the epoch and the active attempt.
//! The level result and any pending transition are transient and never
//! written. Loading is forgiving: a missing, malformed or inconsistent save
//! is reported as "no save" and the caller starts a new game.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::config::GameConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::{Epoch, MutationPoints, SpeciesId, TileId};
use crate::hex::{HexCoordinate, HexKey, HexStore};
use crate::level::{Climate, Flora, LevelInfo, MAX_HEIGHT, MIN_HEIGHT};
use crate::overworld::{HexTile, OverWorld};
use crate::session::storage::KeyValueStore;
use crate::species::{GeneChoice, Genome, Lineage, Species};
use crate::state::{ActionKind, AppState, PopulationAttempt};

/// Bumped whenever the document layout changes
pub const SAVE_VERSION: u32 = 1;

/// Largest axial coordinate a restored tile may sit at; keeps cube math in range
pub const MAX_TILE_COORD: i32 = i32::MAX / 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub version: u32,
    pub seed: u64,
    pub over_world: SavedWorld,
    pub root_species: SavedLineage,
    pub epoch: Epoch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_population_attempt: Option<PopulationAttempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorld {
    pub tiles: BTreeMap<HexKey, SavedTile>,
    pub start_tile_id: TileId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTile {
    pub id: TileId,
    pub i: i32,
    pub j: i32,
    pub info: SavedInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInfo {
    pub height: i8,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<Climate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flora: Option<SavedFlora>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFlora {
    pub species_id: SpeciesId,
    pub mutation_points_per_epoch: MutationPoints,
    #[serde(default)]
    pub action_points: u8,
}

/// Species nodes keyed by id; links are ids, never nested nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLineage {
    pub root_id: SpeciesId,
    pub nodes: BTreeMap<String, SavedSpecies>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSpecies {
    pub id: SpeciesId,
    pub name: String,
    pub genome: Vec<String>,
    pub free_mutation_points: MutationPoints,
    pub total_mutation_points: MutationPoints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<SpeciesId>,
    #[serde(default)]
    pub descendant_ids: Vec<SpeciesId>,
    #[serde(default)]
    pub gene_choices: Vec<GeneChoice>,
}

impl SaveDocument {
    pub fn from_state(state: &AppState) -> Self {
        let tiles = state
            .over_world
            .tiles()
            .iter()
            .map(|(key, tile)| (key, saved_tile(tile)))
            .collect();

        let nodes = state
            .lineage
            .iter()
            .map(|s| (s.id.to_string(), saved_species(s)))
            .collect();

        Self {
            version: SAVE_VERSION,
            seed: state.seed,
            over_world: SavedWorld {
                tiles,
                start_tile_id: state.over_world.start_tile().id,
            },
            root_species: SavedLineage {
                root_id: state.lineage.root_id(),
                nodes,
            },
            epoch: state.epoch,
            active_population_attempt: state.active_population_attempt.clone(),
        }
    }

    /// Rebuild and validate the app state this document describes
    pub fn into_state(self) -> Result<AppState> {
        if self.version != SAVE_VERSION {
            return Err(GameError::InvalidSave(format!(
                "unsupported save version {} (expected {})",
                self.version, SAVE_VERSION
            )));
        }

        let lineage = restore_lineage(self.root_species)?;
        let over_world = restore_world(self.over_world, &lineage)?;

        if let Some(attempt) = &self.active_population_attempt {
            check_attempt(attempt, &over_world, &lineage)?;
        }

        let mut state = AppState::new(over_world, lineage, self.seed);
        state.epoch = self.epoch;
        state.active_population_attempt = self.active_population_attempt;
        Ok(state)
    }
}

fn saved_tile(tile: &HexTile) -> SavedTile {
    SavedTile {
        id: tile.id,
        i: tile.coord.i,
        j: tile.coord.j,
        info: SavedInfo {
            height: tile.info.height,
            visible: tile.info.visible,
            climate: tile.info.climate,
            flora: tile.info.flora.map(|f| SavedFlora {
                species_id: f.species,
                mutation_points_per_epoch: f.mutation_points_per_epoch,
                action_points: f.action_points,
            }),
        },
    }
}

fn saved_species(species: &Species) -> SavedSpecies {
    SavedSpecies {
        id: species.id,
        name: species.name.clone(),
        genome: species.genome.genes.clone(),
        free_mutation_points: species.free_mutation_points,
        total_mutation_points: species.total_mutation_points,
        parent_id: species.parent,
        descendant_ids: species.descendants.clone(),
        gene_choices: species.gene_choices.clone(),
    }
}

fn restore_lineage(saved: SavedLineage) -> Result<Lineage> {
    let mut nodes = Vec::with_capacity(saved.nodes.len());
    for (key, node) in saved.nodes {
        if key != node.id.to_string() {
            return Err(GameError::InvalidSave(format!(
                "species stored under '{}' has id {}",
                key, node.id
            )));
        }
        let mut species = Species::new(node.id, node.name).with_genome(Genome {
            genes: node.genome,
        });
        species.free_mutation_points = node.free_mutation_points;
        species.total_mutation_points = node.total_mutation_points;
        species.parent = node.parent_id;
        species.descendants = node.descendant_ids;
        species.gene_choices = node.gene_choices;
        nodes.push(species);
    }
    Lineage::from_parts(saved.root_id, nodes)
}

fn restore_world(saved: SavedWorld, lineage: &Lineage) -> Result<OverWorld> {
    let mut restored = Vec::with_capacity(saved.tiles.len());
    for (key, tile) in saved.tiles {
        if key != HexKey::new(tile.i, tile.j) {
            return Err(GameError::InvalidSave(format!(
                "tile stored under '{}' sits at {},{}",
                key, tile.i, tile.j
            )));
        }
        restored.push(restore_tile(tile, lineage)?);
    }

    // Generation order is id order; restoring it keeps iteration deterministic
    restored.sort_by_key(|t| t.id);
    if restored.windows(2).any(|w| w[0].id == w[1].id) {
        return Err(GameError::InvalidSave("duplicate tile id".into()));
    }

    let start = restored
        .iter()
        .find(|t| t.id == saved.start_tile_id)
        .map(HexTile::key)
        .ok_or_else(|| {
            GameError::InvalidSave(format!("start tile {:?} is not on the map", saved.start_tile_id))
        })?;

    let mut tiles = HexStore::new();
    for tile in restored {
        let key = tile.key();
        tiles.set(key.i, key.j, tile);
    }
    OverWorld::new(tiles, start)
}

fn restore_tile(tile: SavedTile, lineage: &Lineage) -> Result<HexTile> {
    let bound = MAX_TILE_COORD.unsigned_abs();
    if tile.i.unsigned_abs() > bound || tile.j.unsigned_abs() > bound {
        return Err(GameError::InvalidSave(format!(
            "tile {},{} lies outside +-{}",
            tile.i, tile.j, MAX_TILE_COORD
        )));
    }

    let height = tile.info.height;
    if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
        return Err(GameError::InvalidSave(format!(
            "tile {},{} has height {} outside {}..={}",
            tile.i, tile.j, height, MIN_HEIGHT, MAX_HEIGHT
        )));
    }

    let mut info = LevelInfo::new(height);
    info.visible = tile.info.visible;
    info.climate = tile.info.climate;

    if let Some(flora) = tile.info.flora {
        if flora.action_points > 1 {
            return Err(GameError::InvalidSave(format!(
                "tile {},{} has {} action points",
                tile.i, tile.j, flora.action_points
            )));
        }
        if !lineage.contains(flora.species_id) {
            return Err(GameError::SpeciesNotFound(flora.species_id));
        }
        info.flora = Some(Flora {
            species: flora.species_id,
            mutation_points_per_epoch: flora.mutation_points_per_epoch,
            action_points: flora.action_points,
        });
    }

    Ok(HexTile::new(tile.id, HexCoordinate::new(tile.i, tile.j), info))
}

fn check_attempt(attempt: &PopulationAttempt, world: &OverWorld, lineage: &Lineage) -> Result<()> {
    world.tile(attempt.target)?;
    if let Some(source) = attempt.source {
        world.tile(source)?;
    }
    lineage.species(attempt.species)?;
    Ok(())
}

pub fn serialize(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string(&SaveDocument::from_state(state))?)
}

pub fn deserialize(raw: &str) -> Result<AppState> {
    let doc: SaveDocument = serde_json::from_str(raw)?;
    doc.into_state()
}

/// Actions whose results are written to the store
pub fn should_persist(kind: ActionKind) -> bool {
    matches!(
        kind,
        ActionKind::StartPopulationAttempt
            | ActionKind::PopulationAttemptSuccess
            | ActionKind::GetGameResult
            | ActionKind::GameResultDone
            | ActionKind::NextEpoch
            | ActionKind::AcquireGene
            | ActionKind::Speciate
    )
}

/// Reads and writes the single save slot
pub struct PersistenceGateway<S: KeyValueStore> {
    store: Arc<S>,
    key: String,
    handle: Handle,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>, handle: Handle) -> Self {
        Self {
            store,
            key: key.into(),
            handle,
        }
    }

    /// Gateway bound to the runtime the caller is running on
    pub fn on_current_runtime(store: Arc<S>, key: impl Into<String>) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| GameError::Config(format!("persistence needs a tokio runtime: {}", e)))?;
        Ok(Self::new(store, key, handle))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Write `state` in the background. Failures are logged and dropped;
    /// concurrent writes race and the last one wins.
    pub fn save(&self, state: &AppState) -> Option<JoinHandle<()>> {
        let raw = match serialize(state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize save");
                return None;
            }
        };

        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        let epoch = state.epoch;
        Some(self.handle.spawn(async move {
            match store.set(&key, &raw).await {
                Ok(()) => tracing::info!(key = %key, epoch, bytes = raw.len(), "game saved"),
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to write save"),
            }
        }))
    }

    /// The stored game, or `None` if there is no usable save
    pub async fn load(&self) -> Option<AppState> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(key = %self.key, "no save found");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to read save");
                return None;
            }
        };

        match deserialize(&raw) {
            Ok(state) => {
                tracing::info!(
                    key = %self.key,
                    epoch = state.epoch,
                    species = state.lineage.len(),
                    "game loaded"
                );
                Some(state)
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable save");
                None
            }
        }
    }

    pub async fn load_or_generate(&self, config: &GameConfig) -> Result<AppState> {
        match self.load().await {
            Some(state) => Ok(state),
            None => AppState::initial(config),
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await?;
        tracing::info!(key = %self.key, "save cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::GameResult;
    use crate::state::PendingTransition;
    use crate::state::Action;

    fn sample_state() -> AppState {
        let mut tiles = HexStore::new();
        let mut id = 0;
        for i in -1..=1 {
            for j in -1..=1 {
                let coord = HexCoordinate::new(i, j);
                let height = if coord.magnitude() == 0 { 0 } else { 2 };
                tiles.set(i, j, HexTile::new(TileId(id), coord, LevelInfo::new(height)));
                id += 1;
            }
        }
        let mut world = OverWorld::new(tiles, HexKey::new(0, 0)).unwrap();
        world.tile_mut(HexKey::new(0, 0)).unwrap().info.flora = Some(Flora::settled(SpeciesId(1), 3));
        world.reveal_neighbors(HexKey::new(0, 0));

        let mut lineage = Lineage::new("Protocell");
        let child = lineage.add_descendant(SpeciesId(1), "Offshoot").unwrap();
        lineage.get_mut(child).unwrap().genome.add("flagellum");

        let mut state = AppState::new(world, lineage, 99);
        state.epoch = 4;
        state.active_population_attempt =
            Some(PopulationAttempt::new(Some(HexKey::new(0, 0)), HexKey::new(1, 0), SpeciesId(1)));
        state
    }

    #[test]
    fn test_roundtrip_restores_persisted_fields() {
        let state = sample_state();
        let restored = deserialize(&serialize(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_transient_fields_are_not_saved() {
        let mut state = sample_state();
        state.active_game_result = Some(GameResult::won(2));
        state.transition = Some(PendingTransition {
            action: Box::new(Action::NextEpoch),
            deadline_ms: 10,
        });

        let raw = serialize(&state).unwrap();
        assert!(!raw.contains("activeGameResult"));
        assert!(!raw.contains("transition"));

        let restored = deserialize(&raw).unwrap();
        assert!(restored.active_game_result.is_none());
        assert!(restored.transition.is_none());
    }

    #[test]
    fn test_document_shape() {
        let value: serde_json::Value = serde_json::from_str(&serialize(&sample_state()).unwrap()).unwrap();
        let origin = &value["overWorld"]["tiles"]["0,0"];
        assert_eq!(origin["i"], 0);
        assert_eq!(origin["info"]["height"], 0);
        assert_eq!(origin["info"]["flora"]["speciesId"], 1);
        assert_eq!(origin["info"]["flora"]["mutationPointsPerEpoch"], 3);
        assert_eq!(value["rootSpecies"]["nodes"]["2"]["parentId"], 1);
        assert_eq!(value["epoch"], 4);
    }

    #[test]
    fn test_mismatched_key_is_rejected() {
        let mut doc = SaveDocument::from_state(&sample_state());
        let tile = doc.over_world.tiles.remove(&HexKey::new(1, 0)).unwrap();
        doc.over_world.tiles.insert(HexKey::new(5, 5), tile);
        assert!(matches!(doc.into_state(), Err(GameError::InvalidSave(_))));
    }

    #[test]
    fn test_far_flung_tile_is_rejected() {
        for (i, j) in [(i32::MAX, 0), (0, i32::MIN), (MAX_TILE_COORD + 1, -1)] {
            let mut doc = SaveDocument::from_state(&sample_state());
            let mut tile = doc.over_world.tiles.remove(&HexKey::new(-1, -1)).unwrap();
            tile.i = i;
            tile.j = j;
            doc.over_world.tiles.insert(HexKey::new(i, j), tile);
            let raw = serde_json::to_string(&doc).unwrap();
            assert!(matches!(deserialize(&raw), Err(GameError::InvalidSave(_))));
        }
    }

    #[test]
    fn test_species_id_without_headroom_is_rejected() {
        let mut doc = SaveDocument::from_state(&sample_state());
        let mut offshoot = doc.root_species.nodes.remove("2").unwrap();
        offshoot.id = SpeciesId(u32::MAX);
        doc.root_species.nodes.insert(u32::MAX.to_string(), offshoot);
        doc.root_species.nodes.get_mut("1").unwrap().descendant_ids = vec![SpeciesId(u32::MAX)];

        let raw = serde_json::to_string(&doc).unwrap();
        assert!(matches!(deserialize(&raw), Err(GameError::InvalidSave(_))));
    }

    #[test]
    fn test_unknown_flora_species_is_rejected() {
        let mut doc = SaveDocument::from_state(&sample_state());
        let origin = doc.over_world.tiles.get_mut(&HexKey::new(0, 0)).unwrap();
        origin.info.flora.as_mut().unwrap().species_id = SpeciesId(42);
        assert!(doc.into_state().is_err());
    }

    #[test]
    fn test_missing_start_tile_is_rejected() {
        let mut doc = SaveDocument::from_state(&sample_state());
        doc.over_world.start_tile_id = TileId(1000);
        assert!(matches!(doc.into_state(), Err(GameError::InvalidSave(_))));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut doc = SaveDocument::from_state(&sample_state());
        doc.version = SAVE_VERSION + 1;
        assert!(doc.into_state().is_err());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(deserialize("not json"), Err(GameError::SerdeError(_))));
        assert!(deserialize("{}").is_err());
    }

    #[test]
    fn test_whitelist() {
        assert!(should_persist(ActionKind::NextEpoch));
        assert!(should_persist(ActionKind::GameResultDone));
        assert!(!should_persist(ActionKind::TransitionStart));
        assert!(!should_persist(ActionKind::TransitionEnd));
    }
}
