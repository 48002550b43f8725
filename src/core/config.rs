//! Game configuration with documented constants
//!
//! All tuning numbers for world generation and the session layer live here.
//! Every field has a default, so a TOML file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{GameError, Result};

/// When species receive a fresh set of gene choices on epoch advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneOfferPolicy {
    /// Only the very first epoch advance offers genes
    #[default]
    FirstEpochOnly,
    /// Every epoch advance where the species' pool is positive
    EveryEpoch,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub session: SessionConfig,
}

/// Terrain synthesis and economy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    // === GENERATION ===
    /// Seed for every noise layer and gene draw
    pub seed: u64,

    /// Width of the generated rectangle in cartesian hex units
    pub width: f64,

    /// Height of the generated rectangle in cartesian hex units
    pub height: f64,

    /// Height offset applied before noise is added
    ///
    /// Slightly positive so that most of the map is land and the
    /// shoreline (height 0) sits near the middle of the noise range.
    pub base_height: f64,

    /// Spatial frequency of the continent-scale octave
    pub large_scale_frequency: f64,

    /// Amplitude of the continent-scale octave
    pub large_scale_amplitude: f64,

    /// Spatial frequency of the hill-scale octave
    pub medium_scale_frequency: f64,

    /// Amplitude of the hill-scale octave
    pub medium_scale_amplitude: f64,

    /// Spatial frequency of the roughness octave
    pub small_scale_frequency: f64,

    /// Amplitude of the roughness octave
    pub small_scale_amplitude: f64,

    /// Latitude falloff factor k in `-|y|^2 * k`
    ///
    /// Pushes terrain under water toward the top and bottom edges.
    pub latitude_falloff: f64,

    // === ECONOMY ===
    /// Number of genes offered per gene choice
    pub gene_offer_size: usize,

    /// Which epoch advances repopulate gene choices
    pub gene_offer_policy: GeneOfferPolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            width: 24.0,
            height: 14.0,
            base_height: 1.0,
            large_scale_frequency: 0.08,
            large_scale_amplitude: 3.5,
            medium_scale_frequency: 0.25,
            medium_scale_amplitude: 1.5,
            small_scale_frequency: 0.7,
            small_scale_amplitude: 0.5,
            latitude_falloff: 0.04,
            gene_offer_size: 3,
            gene_offer_policy: GeneOfferPolicy::default(),
        }
    }
}

/// Persistence and transition timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key under which the single save document is stored
    pub save_key: String,

    /// Directory backing the file store
    pub save_dir: PathBuf,

    /// Duration of a deferred transition before `TransitionEnd` fires
    pub transition_ms: u64,

    /// Reject `GetGameResult` without an active attempt as a hard error
    ///
    /// Defaults to on in debug builds and off in release builds.
    pub strict_game_results: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_key: "overworld-save".into(),
            save_dir: PathBuf::from("saves"),
            transition_ms: 600,
            strict_game_results: cfg!(debug_assertions),
        }
    }
}

impl GameConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let w = &self.world;
        if !(w.width > 0.0 && w.height > 0.0) {
            return Err(GameError::Config(format!(
                "world dimensions must be positive, got {}x{}",
                w.width, w.height
            )));
        }

        let frequencies = [
            w.large_scale_frequency,
            w.medium_scale_frequency,
            w.small_scale_frequency,
        ];
        if frequencies.iter().any(|f| *f <= 0.0) {
            return Err(GameError::Config("noise frequencies must be positive".into()));
        }

        if w.latitude_falloff < 0.0 {
            return Err(GameError::Config(format!(
                "latitude_falloff ({}) must not be negative",
                w.latitude_falloff
            )));
        }

        if w.gene_offer_size == 0 {
            return Err(GameError::Config("gene_offer_size must be at least 1".into()));
        }

        if self.session.save_key.trim().is_empty() {
            return Err(GameError::Config("save_key must not be empty".into()));
        }

        Ok(())
    }
}
