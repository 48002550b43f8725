//! Clade Overworld - hex map, lineage and epoch loop of an evolution strategy game

pub mod core;
pub mod hex;
pub mod level;
pub mod overworld;
pub mod session;
pub mod species;
pub mod state;
