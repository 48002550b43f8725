pub mod coord;
pub mod store;

pub use coord::{round_cube, HexCoordinate, HEX_SQUISH, NEIGHBOR_OFFSETS};
pub use store::{HexKey, HexStore, ParseHexKeyError};
