//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for hex tiles, assigned in generation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for species in a lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Overworld turn counter
pub type Epoch = u64;

/// Mutation points (the overworld currency)
pub type MutationPoints = u32;
