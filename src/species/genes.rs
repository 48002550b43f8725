//! Gene offers
//!
//! Gene definitions belong to the level simulation. The overworld only needs
//! to know which genes to offer a species and what they cost.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::lineage::{GeneChoice, Species};

/// Source of gene offers
pub trait GeneCatalog: Send + Sync {
    /// Genes to offer `species`.
    ///
    /// `first_choice` marks the very first epoch advance of a game, which
    /// may return a fixed starter set. `seed` makes random draws reproducible.
    fn offer(&self, species: &Species, first_choice: bool, seed: u64) -> Vec<GeneChoice>;
}

/// Fixed catalog with a starter set and a random pool
#[derive(Debug, Clone)]
pub struct StaticGeneCatalog {
    starters: Vec<GeneChoice>,
    pool: Vec<GeneChoice>,
    offer_size: usize,
}

impl StaticGeneCatalog {
    pub fn new(starters: Vec<GeneChoice>, pool: Vec<GeneChoice>, offer_size: usize) -> Self {
        Self {
            starters,
            pool,
            offer_size,
        }
    }

    /// Built-in cell genes
    pub fn with_defaults(offer_size: usize) -> Self {
        let starters = vec![
            GeneChoice::new("photosynthesis", 1),
            GeneChoice::new("flagellum", 1),
            GeneChoice::new("cell_wall", 1),
        ];
        let pool = vec![
            GeneChoice::new("photosynthesis", 2),
            GeneChoice::new("flagellum", 2),
            GeneChoice::new("cell_wall", 2),
            GeneChoice::new("chemosynthesis", 3),
            GeneChoice::new("cilia", 2),
            GeneChoice::new("toxin_secretion", 4),
            GeneChoice::new("spore_dispersal", 3),
            GeneChoice::new("salt_tolerance", 2),
            GeneChoice::new("cold_tolerance", 2),
            GeneChoice::new("symbiosis", 5),
        ];
        Self::new(starters, pool, offer_size)
    }
}

impl GeneCatalog for StaticGeneCatalog {
    fn offer(&self, species: &Species, first_choice: bool, seed: u64) -> Vec<GeneChoice> {
        if first_choice {
            return self.starters.iter().take(self.offer_size).cloned().collect();
        }

        let candidates: Vec<&GeneChoice> = self
            .pool
            .iter()
            .filter(|choice| !species.genome.contains(&choice.gene))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        candidates
            .choose_multiple(&mut rng, self.offer_size)
            .map(|choice| (*choice).clone())
            .collect()
    }
}
