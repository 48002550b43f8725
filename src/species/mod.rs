//! Species and lineage - the mutation-point economy's tree of clades

pub mod genes;
pub mod lineage;

pub use genes::{GeneCatalog, StaticGeneCatalog};
pub use lineage::{GeneChoice, Genome, Lineage, Species};
