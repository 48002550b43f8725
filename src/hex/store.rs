//! O(1) hex storage keyed by (i, j)
//!
//! Entries keep their insertion order so that iteration (and anything that
//! breaks ties by iteration order) is deterministic.

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use super::coord::HexCoordinate;

/// Stable storage key for a hex, encoded as `"<i>,<j>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexKey {
    pub i: i32,
    pub j: i32,
}

impl HexKey {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    pub fn coord(&self) -> HexCoordinate {
        HexCoordinate::new(self.i, self.j)
    }
}

impl From<HexCoordinate> for HexKey {
    fn from(coord: HexCoordinate) -> Self {
        Self::new(coord.i, coord.j)
    }
}

impl fmt::Display for HexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

/// Error parsing a `"<i>,<j>"` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHexKeyError(pub String);

impl fmt::Display for ParseHexKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex key '{}'", self.0)
    }
}

impl std::error::Error for ParseHexKeyError {}

impl FromStr for HexKey {
    type Err = ParseHexKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHexKeyError(s.to_string());
        let (i, j) = s.split_once(',').ok_or_else(err)?;
        let i = i.trim().parse().map_err(|_| err())?;
        let j = j.trim().parse().map_err(|_| err())?;
        Ok(Self::new(i, j))
    }
}

impl Serialize for HexKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash-indexed hex storage
#[derive(Debug, Clone)]
pub struct HexStore<T> {
    entries: Vec<(HexKey, T)>,
    index: AHashMap<HexKey, usize>,
}

impl<T> Default for HexStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for HexStore<T> {
    fn eq(&self, other: &Self) -> bool {
        // The index is derived from the entries
        self.entries == other.entries
    }
}

impl<T> Index<HexKey> for HexStore<T> {
    type Output = T;

    /// Panics if no value is stored at `key`
    fn index(&self, key: HexKey) -> &T {
        match self.get(key.i, key.j) {
            Some(value) => value,
            None => panic!("no hex stored at {}", key),
        }
    }
}

impl<T> HexStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: i32, j: i32) -> Option<&T> {
        self.index
            .get(&HexKey::new(i, j))
            .map(|&idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, i: i32, j: i32) -> Option<&mut T> {
        self.index
            .get(&HexKey::new(i, j))
            .map(|&idx| &mut self.entries[idx].1)
    }

    pub fn contains(&self, i: i32, j: i32) -> bool {
        self.index.contains_key(&HexKey::new(i, j))
    }

    /// Insert or replace the value at (i, j), returning the previous value
    pub fn set(&mut self, i: i32, j: i32, value: T) -> Option<T> {
        let key = HexKey::new(i, j);
        match self.index.get(&key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// The 6 neighbor slots in canonical angular order; `None` where no tile is stored
    pub fn neighbors(&self, i: i32, j: i32) -> [Option<&T>; 6] {
        HexCoordinate::new(i, j)
            .neighbors()
            .map(|n| self.get(n.i, n.j))
    }

    pub fn keys(&self) -> impl Iterator<Item = HexKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HexKey, &T)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|(_, value)| value)
    }
}
