//! Seeded terrain synthesis
//!
//! Heights come from several octaves of Perlin noise sampled at the cartesian
//! hex centers, minus a latitude falloff that sinks the top and bottom edges.
//! Only hexes whose centers fall inside the requested rectangle are kept, so
//! the stored region is sparse relative to the enclosing cube radius.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::WorldConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::TileId;
use crate::hex::{HexCoordinate, HexKey, HexStore, HEX_SQUISH};
use crate::level::{Climate, LevelInfo, MAX_HEIGHT, MIN_HEIGHT};
use crate::overworld::tile::HexTile;
use crate::overworld::world::OverWorld;

/// Deterministic terrain generator
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    config: WorldConfig,
}

/// One octave of noise
struct Octave {
    noise: Perlin,
    frequency: f64,
    amplitude: f64,
}

impl Octave {
    fn sample(&self, x: f64, y: f64) -> f64 {
        self.noise.get([x * self.frequency, y * self.frequency]) * self.amplitude
    }
}

impl Default for WorldGenerator {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl WorldGenerator {
    pub fn new(config: WorldConfig) -> Self {
        Self { config }
    }

    /// Generate using the seed and dimensions from the config
    pub fn generate_from_config(&self) -> Result<OverWorld> {
        self.generate(self.config.seed, self.config.width, self.config.height)
    }

    /// Generate a world and choose its start tile.
    ///
    /// Fails with `DegenerateWorld` when no height-0 tile exists.
    pub fn generate(&self, seed: u64, width: f64, height: f64) -> Result<OverWorld> {
        let tiles = self.generate_tiles(seed, width, height);
        let start = select_start_tile(&tiles).ok_or(GameError::DegenerateWorld { seed })?;

        tracing::debug!(
            seed,
            tiles = tiles.len(),
            start = %start,
            "generated overworld"
        );

        OverWorld::new(tiles, start)
    }

    /// Synthesize every tile inside the `width` x `height` rectangle centered on the origin
    pub fn generate_tiles(&self, seed: u64, width: f64, height: f64) -> HexStore<HexTile> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let octaves = [
            Octave {
                noise: Perlin::new(rng.gen()),
                frequency: self.config.large_scale_frequency,
                amplitude: self.config.large_scale_amplitude,
            },
            Octave {
                noise: Perlin::new(rng.gen()),
                frequency: self.config.medium_scale_frequency,
                amplitude: self.config.medium_scale_amplitude,
            },
            Octave {
                noise: Perlin::new(rng.gen()),
                frequency: self.config.small_scale_frequency,
                amplitude: self.config.small_scale_amplitude,
            },
        ];
        let humidity = Perlin::new(rng.gen());

        let half_width = width / 2.0;
        let half_height = height / 2.0;
        let radius = covering_radius(half_width, half_height);

        let mut tiles = HexStore::new();
        let mut next_id = 0;

        for i in -radius..=radius {
            let j_min = (-radius).max(-i - radius);
            let j_max = radius.min(-i + radius);
            for j in j_min..=j_max {
                let coord = HexCoordinate::new(i, j);
                let (x, y) = coord.cartesian();
                if x.abs() > half_width || y.abs() > half_height {
                    continue;
                }

                let raw = self.config.base_height
                    + octaves.iter().map(|o| o.sample(x, y)).sum::<f64>()
                    - y.abs().powi(2) * self.config.latitude_falloff;

                let climate = Climate {
                    temperature: 1.0 - (y.abs() / half_height).min(1.0),
                    humidity: ((humidity.get([x * 0.15, y * 0.15]) + 1.0) / 2.0).clamp(0.0, 1.0),
                };
                let info = LevelInfo::new(quantize_height(raw)).with_climate(climate);

                tiles.set(i, j, HexTile::new(TileId(next_id), coord, info));
                next_id += 1;
            }
        }

        tiles
    }
}

/// Generate a `width` x `height` world with default noise settings
pub fn generate_rectangle(seed: u64, width: f64, height: f64) -> Result<OverWorld> {
    WorldGenerator::default().generate(seed, width, height)
}

/// Clamp to [-1, 6] and round, except that (-1, 0) always becomes 0
pub fn quantize_height(raw: f64) -> i8 {
    let min = MIN_HEIGHT as f64;
    let clamped = raw.clamp(min, MAX_HEIGHT as f64);
    if clamped > min && clamped < 0.0 {
        return 0;
    }
    clamped.round() as i8
}

/// Height-0 tile closest to the origin; ties go to the first in iteration order
pub fn select_start_tile(tiles: &HexStore<HexTile>) -> Option<HexKey> {
    let mut best: Option<(i32, HexKey)> = None;
    for (key, tile) in tiles.iter() {
        if tile.info.height != 0 {
            continue;
        }
        let magnitude = tile.coord.magnitude();
        if best.map_or(true, |(m, _)| magnitude < m) {
            best = Some((magnitude, key));
        }
    }
    best.map(|(_, key)| key)
}

/// Cube radius whose hexagon encloses the rectangle
fn covering_radius(half_width: f64, half_height: f64) -> i32 {
    let i_max = (half_width / 1.5).ceil();
    let j_max = ((half_height + HEX_SQUISH * i_max) / (2.0 * HEX_SQUISH)).ceil();
    (i_max + j_max) as i32
}
