//! Lineage - the species tree stored as a flat registry
//!
//! Parents and descendants are id references into the registry, so the tree
//! can be cloned, diffed and serialized without any pointer graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::{GameError, Result};
use crate::core::types::{MutationPoints, SpeciesId};

/// Highest id a restored lineage may carry; ids above it leave no room to branch
pub const MAX_SPECIES_ID: u32 = u32::MAX / 2;

/// Opaque gene list; gene semantics live in the level simulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genome {
    pub genes: Vec<String>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.genes.iter().any(|g| g == gene)
    }

    pub fn add(&mut self, gene: impl Into<String>) {
        self.genes.push(gene.into());
    }
}

/// A gene on offer and its price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneChoice {
    pub gene: String,
    pub cost: MutationPoints,
}

impl GeneChoice {
    pub fn new(gene: impl Into<String>, cost: MutationPoints) -> Self {
        Self {
            gene: gene.into(),
            cost,
        }
    }
}

/// A node in the lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    pub genome: Genome,
    /// Points available to spend on genes
    pub free_mutation_points: MutationPoints,
    /// Cached gene pool, refreshed from the overworld after flora changes
    pub total_mutation_points: MutationPoints,
    pub parent: Option<SpeciesId>,
    pub descendants: Vec<SpeciesId>,
    /// Pending gene offer
    pub gene_choices: Vec<GeneChoice>,
}

impl Species {
    pub fn new(id: SpeciesId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            genome: Genome::new(),
            free_mutation_points: 0,
            total_mutation_points: 0,
            parent: None,
            descendants: Vec::new(),
            gene_choices: Vec::new(),
        }
    }

    pub fn with_genome(mut self, genome: Genome) -> Self {
        self.genome = genome;
        self
    }
}

/// All species reachable from one root
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    root: SpeciesId,
    species: BTreeMap<SpeciesId, Species>,
    next_id: u32,
}

impl Lineage {
    /// A lineage holding only its root species
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = SpeciesId(1);
        let mut species = BTreeMap::new();
        species.insert(root, Species::new(root, root_name));
        Self {
            root,
            species,
            next_id: 2,
        }
    }

    /// Rebuild a lineage from stored nodes, checking that they form one tree under `root`
    pub fn from_parts(root: SpeciesId, nodes: impl IntoIterator<Item = Species>) -> Result<Self> {
        let species: BTreeMap<SpeciesId, Species> = nodes.into_iter().map(|s| (s.id, s)).collect();

        let root_node = species.get(&root).ok_or(GameError::SpeciesNotFound(root))?;
        if root_node.parent.is_some() {
            return Err(GameError::InvalidSave(format!("root species {} has a parent", root)));
        }

        for node in species.values() {
            for child in &node.descendants {
                let child_node = species.get(child).ok_or(GameError::SpeciesNotFound(*child))?;
                if child_node.parent != Some(node.id) {
                    return Err(GameError::InvalidSave(format!(
                        "species {} lists {} as descendant but parent is {:?}",
                        node.id, child, child_node.parent
                    )));
                }
            }
            if let Some(parent) = node.parent {
                let parent_node = species.get(&parent).ok_or(GameError::SpeciesNotFound(parent))?;
                if !parent_node.descendants.contains(&node.id) {
                    return Err(GameError::InvalidSave(format!(
                        "species {} is missing from its parent {}",
                        node.id, parent
                    )));
                }
            }
        }

        let max_id = species.keys().map(|id| id.0).max().unwrap_or(0);
        if max_id > MAX_SPECIES_ID {
            return Err(GameError::InvalidSave(format!(
                "species id {} is above {}",
                max_id, MAX_SPECIES_ID
            )));
        }
        let next_id = max_id
            .checked_add(1)
            .ok_or_else(|| GameError::InvalidSave(format!("species id {} leaves no room", max_id)))?;
        let lineage = Self {
            root,
            species,
            next_id,
        };

        // Every node must hang off the root exactly once
        if lineage.pre_order().len() != lineage.species.len() {
            return Err(GameError::InvalidSave(
                "species tree is not connected to the root".into(),
            ));
        }

        Ok(lineage)
    }

    pub fn root_id(&self) -> SpeciesId {
        self.root
    }

    pub fn root(&self) -> &Species {
        &self.species[&self.root]
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    pub fn get_mut(&mut self, id: SpeciesId) -> Option<&mut Species> {
        self.species.get_mut(&id)
    }

    pub fn species(&self, id: SpeciesId) -> Result<&Species> {
        self.get(id).ok_or(GameError::SpeciesNotFound(id))
    }

    pub fn species_mut(&mut self, id: SpeciesId) -> Result<&mut Species> {
        self.get_mut(id).ok_or(GameError::SpeciesNotFound(id))
    }

    pub fn contains(&self, id: SpeciesId) -> bool {
        self.species.contains_key(&id)
    }

    /// Nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    /// Branch a new species off `parent`; it inherits the parent's genome
    pub fn add_descendant(&mut self, parent: SpeciesId, name: impl Into<String>) -> Result<SpeciesId> {
        let genome = self.species(parent)?.genome.clone();

        let id = SpeciesId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| GameError::Config(format!("species ids exhausted at {}", id)))?;

        let mut child = Species::new(id, name).with_genome(genome);
        child.parent = Some(parent);
        self.species.insert(id, child);
        self.species_mut(parent)?.descendants.push(id);

        tracing::debug!(parent = %parent, child = %id, "species branched");
        Ok(id)
    }

    /// Depth-first pre-order walk from the root, children in insertion order
    pub fn pre_order(&self) -> Vec<SpeciesId> {
        let mut order = Vec::with_capacity(self.species.len());
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            // Guard against cycles in hand-built or corrupt trees
            if order.contains(&id) {
                continue;
            }
            let Some(node) = self.species.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.descendants.iter().rev().copied());
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lineage_has_root() {
        let lineage = Lineage::new("Protocell");
        assert_eq!(lineage.len(), 1);
        assert_eq!(lineage.root().name, "Protocell");
        assert_eq!(lineage.root().parent, None);
    }

    #[test]
    fn test_descendants_inherit_genome() {
        let mut lineage = Lineage::new("Protocell");
        let root = lineage.root_id();
        lineage.get_mut(root).unwrap().genome.add("flagellum");

        let child = lineage.add_descendant(root, "Swimmer").unwrap();
        let node = lineage.get(child).unwrap();
        assert_eq!(node.parent, Some(root));
        assert!(node.genome.contains("flagellum"));
        assert_eq!(lineage.root().descendants, vec![child]);
    }

    #[test]
    fn test_unknown_parent_is_error() {
        let mut lineage = Lineage::new("Protocell");
        assert!(matches!(
            lineage.add_descendant(SpeciesId(99), "Ghost"),
            Err(GameError::SpeciesNotFound(SpeciesId(99)))
        ));
        assert_eq!(lineage.len(), 1);
    }

    #[test]
    fn test_pre_order() {
        let mut lineage = Lineage::new("A");
        let a = lineage.root_id();
        let b = lineage.add_descendant(a, "B").unwrap();
        let c = lineage.add_descendant(a, "C").unwrap();
        let d = lineage.add_descendant(b, "D").unwrap();
        assert_eq!(lineage.pre_order(), vec![a, b, d, c]);
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let mut lineage = Lineage::new("A");
        let a = lineage.root_id();
        let b = lineage.add_descendant(a, "B").unwrap();
        lineage.add_descendant(b, "C").unwrap();

        let rebuilt = Lineage::from_parts(a, lineage.iter().cloned()).unwrap();
        assert_eq!(rebuilt, lineage);
    }

    #[test]
    fn test_from_parts_rejects_orphans() {
        let root = Species::new(SpeciesId(1), "A");
        let mut orphan = Species::new(SpeciesId(2), "B");
        orphan.parent = Some(SpeciesId(7));
        assert!(Lineage::from_parts(SpeciesId(1), vec![root, orphan]).is_err());
    }

    #[test]
    fn test_from_parts_rejects_disconnected() {
        let root = Species::new(SpeciesId(1), "A");
        let stray = Species::new(SpeciesId(2), "B");
        assert!(matches!(
            Lineage::from_parts(SpeciesId(1), vec![root, stray]),
            Err(GameError::InvalidSave(_))
        ));
    }

    #[test]
    fn test_from_parts_rejects_ids_without_headroom() {
        let mut root = Species::new(SpeciesId(1), "A");
        let mut last = Species::new(SpeciesId(u32::MAX), "B");
        last.parent = Some(SpeciesId(1));
        root.descendants.push(SpeciesId(u32::MAX));
        assert!(matches!(
            Lineage::from_parts(SpeciesId(1), vec![root.clone(), last]),
            Err(GameError::InvalidSave(_))
        ));

        let mut highest = Species::new(SpeciesId(MAX_SPECIES_ID), "C");
        highest.parent = Some(SpeciesId(1));
        root.descendants = vec![SpeciesId(MAX_SPECIES_ID)];
        let mut lineage = Lineage::from_parts(SpeciesId(1), vec![root, highest]).unwrap();
        let next = lineage.add_descendant(SpeciesId(1), "D").unwrap();
        assert_eq!(next, SpeciesId(MAX_SPECIES_ID + 1));
    }
}
