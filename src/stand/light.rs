//! Constant ambient light provider
//!
//! Stands in for a full light behavior: it registers the `"Light"` field
//! growth plugins depend on and fills it with a fixed global light index.

use crate::core::types::{SpeciesId, SpeciesTypeCombo, TreeType};
use crate::stand::population::TreePopulation;

/// Field name light-dependent growth reads
pub const LIGHT_FIELD: &str = "Light";

const LIT_TYPES: [TreeType; 3] = [TreeType::Seedling, TreeType::Sapling, TreeType::Adult];

#[derive(Debug, Clone)]
pub struct AmbientLight {
    /// Global light index, percent of full sun (0-100)
    pub gli: f64,
}

impl AmbientLight {
    pub fn new(gli: f64) -> Self {
        Self { gli: gli.clamp(0.0, 100.0) }
    }

    /// Register the light field for every living stage of every species
    pub fn register(&self, population: &mut dyn TreePopulation, num_species: usize) {
        for species in 0..num_species {
            for tree_type in LIT_TYPES {
                let combo = SpeciesTypeCombo::new(SpeciesId(species as u16), tree_type);
                population.register_field(LIGHT_FIELD, combo);
            }
        }
    }

    /// Write the light index into every live tree that has the field
    pub fn apply(&self, population: &mut dyn TreePopulation) {
        for id in population.live_trees() {
            let Some(combo) = population.tree(id).map(|t| t.combo()) else {
                continue;
            };
            let Some(code) = population.field_code(LIGHT_FIELD, combo) else {
                continue;
            };
            if let Some(tree) = population.tree_mut(id) {
                tree.set_field(code, self.gli);
            }
        }
    }
}
