//! The overworld: generated hex map and its aggregate queries

pub mod display;
pub mod generation;
pub mod tile;
pub mod world;

pub use display::render_ascii;
pub use generation::{generate_rectangle, quantize_height, select_start_tile, WorldGenerator};
pub use tile::HexTile;
pub use world::OverWorld;
