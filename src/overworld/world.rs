//! OverWorld - the hex map aggregate and its spatial / economy queries

use crate::core::error::{GameError, Result};
use crate::core::types::{MutationPoints, SpeciesId};
use crate::hex::{HexCoordinate, HexKey, HexStore};
use crate::overworld::tile::HexTile;

/// The overworld map and its start tile
#[derive(Debug, Clone, PartialEq)]
pub struct OverWorld {
    tiles: HexStore<HexTile>,
    start_tile: HexKey,
}

impl OverWorld {
    /// Wrap generated tiles; the start tile is always made visible
    pub fn new(mut tiles: HexStore<HexTile>, start_tile: HexKey) -> Result<Self> {
        let start = tiles
            .get_mut(start_tile.i, start_tile.j)
            .ok_or(GameError::TileNotFound(start_tile))?;
        start.info.visible = true;
        Ok(Self { tiles, start_tile })
    }

    pub fn tiles(&self) -> &HexStore<HexTile> {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn start_tile(&self) -> &HexTile {
        // Presence is checked in `new` and tiles are never removed
        &self.tiles[self.start_tile]
    }

    pub fn start_key(&self) -> HexKey {
        self.start_tile
    }

    pub fn get(&self, key: HexKey) -> Option<&HexTile> {
        self.tiles.get(key.i, key.j)
    }

    pub fn get_mut(&mut self, key: HexKey) -> Option<&mut HexTile> {
        self.tiles.get_mut(key.i, key.j)
    }

    /// Look up a tile, failing with `TileNotFound`
    pub fn tile(&self, key: HexKey) -> Result<&HexTile> {
        self.get(key).ok_or(GameError::TileNotFound(key))
    }

    pub fn tile_mut(&mut self, key: HexKey) -> Result<&mut HexTile> {
        self.get_mut(key).ok_or(GameError::TileNotFound(key))
    }

    /// Tile under a cartesian point, if one is stored there
    pub fn hex_at_point(&self, x: f64, y: f64) -> Option<&HexTile> {
        let coord = HexCoordinate::from_cartesian(x, y);
        self.tiles.get(coord.i, coord.j)
    }

    /// Six neighbor slots in canonical order, recomputed from coordinates every call
    pub fn hex_neighbors(&self, tile: &HexTile) -> [Option<&HexTile>; 6] {
        self.tiles.neighbors(tile.coord.i, tile.coord.j)
    }

    /// Occupied neighbors that can still act and that would not reinforce the target's occupant
    pub fn possible_migration_sources(&self, target: &HexTile) -> Vec<&HexTile> {
        let occupant = target.info.occupant();
        self.hex_neighbors(target)
            .into_iter()
            .flatten()
            .filter(|n| match n.info.active_flora() {
                Some(flora) => occupant != Some(flora.species),
                None => false,
            })
            .collect()
    }

    /// Neighbors a source can migrate into: empty, or held by a different species
    pub fn possible_migration_targets(&self, source: &HexTile) -> Vec<&HexTile> {
        let Some(flora) = source.info.active_flora() else {
            return Vec::new();
        };
        self.hex_neighbors(source)
            .into_iter()
            .flatten()
            .filter(|n| n.info.occupant() != Some(flora.species))
            .collect()
    }

    /// Give every occupied tile its action point for the new epoch
    pub fn reset_action_points(&mut self) {
        for tile in self.tiles.values_mut() {
            if let Some(flora) = tile.info.flora.as_mut() {
                flora.refresh_action_points();
            }
        }
    }

    /// Occupied tiles that have not spent their action point
    pub fn unused_hexes(&self) -> Vec<&HexTile> {
        self.tiles
            .values()
            .filter(|t| t.info.active_flora().is_some())
            .collect()
    }

    /// Tiles currently held by `species`
    pub fn territory(&self, species: SpeciesId) -> impl Iterator<Item = &HexTile> {
        self.tiles
            .values()
            .filter(move |t| t.info.occupant() == Some(species))
    }

    pub fn occupied_tiles(&self) -> impl Iterator<Item = &HexTile> {
        self.tiles.values().filter(|t| t.info.flora.is_some())
    }

    /// Sum of `mutation_points_per_epoch` over the species' territory.
    ///
    /// This full scan is the only source of truth for a gene pool; callers
    /// must rerun it after any flora change that touches the species.
    pub fn get_max_gene_pool(&self, species: SpeciesId) -> MutationPoints {
        self.territory(species)
            .filter_map(|t| t.info.flora)
            .map(|f| f.mutation_points_per_epoch)
            .sum()
    }

    /// Lift the fog of war around a tile; returns how many tiles were newly revealed
    pub fn reveal_neighbors(&mut self, key: HexKey) -> usize {
        let mut revealed = 0;
        for n in key.coord().neighbors() {
            if let Some(tile) = self.tiles.get_mut(n.i, n.j) {
                if !tile.info.visible {
                    tile.info.visible = true;
                    revealed += 1;
                }
            }
        }
        revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TileId;
    use crate::level::{Flora, LevelInfo};

    /// Center hex plus its full ring, all visible height-1 land, start at origin
    fn ring_world() -> OverWorld {
        let mut tiles = HexStore::new();
        let center = HexCoordinate::new(0, 0);
        tiles.set(0, 0, HexTile::new(TileId(0), center, LevelInfo::new(0)));
        for (idx, n) in center.neighbors().iter().enumerate() {
            let tile = HexTile::new(TileId(idx as u32 + 1), *n, LevelInfo::new(1));
            tiles.set(n.i, n.j, tile.with_visibility(true));
        }
        OverWorld::new(tiles, HexKey::new(0, 0)).unwrap()
    }

    fn settle(world: &mut OverWorld, key: HexKey, species: u32, mp: u32, ap: u8) {
        world.tile_mut(key).unwrap().info.flora = Some(Flora {
            species: SpeciesId(species),
            mutation_points_per_epoch: mp,
            action_points: ap,
        });
    }

    #[test]
    fn test_start_tile_forced_visible() {
        let mut tiles = HexStore::new();
        tiles.set(0, 0, HexTile::new(TileId(0), HexCoordinate::new(0, 0), LevelInfo::new(0)));
        let world = OverWorld::new(tiles, HexKey::new(0, 0)).unwrap();
        assert!(world.start_tile().info.visible);
    }

    #[test]
    fn test_missing_start_tile_is_error() {
        let tiles = HexStore::new();
        assert!(matches!(
            OverWorld::new(tiles, HexKey::new(0, 0)),
            Err(GameError::TileNotFound(_))
        ));
    }

    #[test]
    fn test_edge_neighbors_report_gaps() {
        let world = ring_world();
        let edge = world.get(HexKey::new(1, 0)).unwrap();
        let neighbors = world.hex_neighbors(edge);
        assert_eq!(neighbors.len(), 6);
        // (2,0) is off the map; the center sits in the (-1,0) slot
        assert!(neighbors[0].is_none());
        assert_eq!(neighbors[3].map(|t| t.id), Some(TileId(0)));
    }

    #[test]
    fn test_sources_exclude_spent_and_same_species() {
        let mut world = ring_world();
        settle(&mut world, HexKey::new(1, 0), 1, 2, 1);
        settle(&mut world, HexKey::new(0, 1), 2, 2, 1);
        settle(&mut world, HexKey::new(-1, 1), 3, 2, 0);

        let target = world.get(HexKey::new(0, 0)).unwrap().clone();
        let sources: Vec<_> = world.possible_migration_sources(&target).iter().map(|t| t.key()).collect();
        assert_eq!(sources, vec![HexKey::new(1, 0), HexKey::new(0, 1)]);

        // Once species 1 holds the target it can no longer reinforce it
        settle(&mut world, HexKey::new(0, 0), 1, 2, 0);
        let target = world.get(HexKey::new(0, 0)).unwrap().clone();
        let sources: Vec<_> = world.possible_migration_sources(&target).iter().map(|t| t.key()).collect();
        assert_eq!(sources, vec![HexKey::new(0, 1)]);
    }

    #[test]
    fn test_targets_require_action_point() {
        let mut world = ring_world();
        settle(&mut world, HexKey::new(0, 0), 1, 3, 0);
        let source = world.get(HexKey::new(0, 0)).unwrap().clone();
        assert!(world.possible_migration_targets(&source).is_empty());

        world.reset_action_points();
        settle(&mut world, HexKey::new(1, 0), 1, 3, 1);
        settle(&mut world, HexKey::new(0, 1), 2, 3, 1);
        let source = world.get(HexKey::new(0, 0)).unwrap().clone();
        let targets = world.possible_migration_targets(&source);
        // Own tile excluded, rival and empty tiles included
        assert_eq!(targets.len(), 5);
        assert!(targets.iter().all(|t| t.key() != HexKey::new(1, 0)));
    }

    #[test]
    fn test_reset_and_unused() {
        let mut world = ring_world();
        settle(&mut world, HexKey::new(0, 0), 1, 3, 0);
        settle(&mut world, HexKey::new(1, 0), 2, 3, 0);
        assert!(world.unused_hexes().is_empty());

        world.reset_action_points();
        assert_eq!(world.unused_hexes().len(), 2);
        // Empty tiles never gain flora from a reset
        assert_eq!(world.occupied_tiles().count(), 2);
    }

    #[test]
    fn test_gene_pool_sums_territory() {
        let mut world = ring_world();
        settle(&mut world, HexKey::new(0, 0), 1, 3, 0);
        settle(&mut world, HexKey::new(1, 0), 1, 4, 0);
        settle(&mut world, HexKey::new(0, 1), 2, 10, 0);
        assert_eq!(world.get_max_gene_pool(SpeciesId(1)), 7);
        assert_eq!(world.get_max_gene_pool(SpeciesId(2)), 10);
        assert_eq!(world.get_max_gene_pool(SpeciesId(3)), 0);
    }

    #[test]
    fn test_reveal_neighbors_counts_new_tiles() {
        let mut tiles = HexStore::new();
        let center = HexCoordinate::new(0, 0);
        tiles.set(0, 0, HexTile::new(TileId(0), center, LevelInfo::new(0)));
        for (idx, n) in center.neighbors().iter().enumerate() {
            tiles.set(n.i, n.j, HexTile::new(TileId(idx as u32 + 1), *n, LevelInfo::new(1)));
        }
        let mut world = OverWorld::new(tiles, HexKey::new(0, 0)).unwrap();

        assert_eq!(world.reveal_neighbors(HexKey::new(0, 0)), 6);
        assert_eq!(world.reveal_neighbors(HexKey::new(0, 0)), 0);
        assert!(world.tiles().values().all(|t| t.info.visible));
    }

    #[test]
    fn test_hex_at_point() {
        let world = ring_world();
        let (x, y) = HexCoordinate::new(-1, 1).cartesian();
        assert_eq!(world.hex_at_point(x + 0.1, y).map(|t| t.id), Some(TileId(3)));
        assert!(world.hex_at_point(100.0, 0.0).is_none());
    }
}
