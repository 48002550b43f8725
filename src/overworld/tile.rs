use serde::{Deserialize, Serialize};

use crate::core::types::TileId;
use crate::hex::{HexCoordinate, HexKey};
use crate::level::LevelInfo;

/// A single hex tile on the overworld
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexTile {
    pub id: TileId,
    pub coord: HexCoordinate,
    pub info: LevelInfo,
}

impl HexTile {
    pub fn new(id: TileId, coord: HexCoordinate, info: LevelInfo) -> Self {
        Self { id, coord, info }
    }

    pub fn key(&self) -> HexKey {
        self.coord.into()
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.info.visible = visible;
        self
    }
}
