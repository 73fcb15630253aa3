//! Growth registry: builds the species × type dispatch table
//!
//! Each cell of the table names at most one diameter plugin and at most one
//! height plugin. Tables are dense and flat, indexed by
//! `species * NUM_TREE_TYPES + type`.

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::{SpeciesId, SpeciesTypeCombo, TreeType, NUM_TREE_TYPES};
use crate::growth::plugin::{GrowthMethod, GrowthPlugin, PluginId};

/// Which plugin handles diameter and height growth for each combo
#[derive(Debug, Clone)]
pub struct DispatchTable {
    num_species: usize,
    diameter: Vec<Option<PluginId>>,
    height: Vec<Option<PluginId>>,
    /// Plugins filling the diameter table, in registration order
    diameter_plugins: Vec<PluginId>,
    /// Plugins filling the height table, in registration order
    height_plugins: Vec<PluginId>,
}

impl DispatchTable {
    /// Create an empty table for `num_species` species
    pub fn new(num_species: usize) -> Self {
        let cells = num_species * NUM_TREE_TYPES;
        Self {
            num_species,
            diameter: vec![None; cells],
            height: vec![None; cells],
            diameter_plugins: Vec::new(),
            height_plugins: Vec::new(),
        }
    }

    pub fn num_species(&self) -> usize {
        self.num_species
    }

    fn cell(&self, combo: SpeciesTypeCombo) -> Option<usize> {
        let species = combo.species.index();
        (species < self.num_species).then(|| species * NUM_TREE_TYPES + combo.tree_type.index())
    }

    pub fn diameter_plugin(&self, combo: SpeciesTypeCombo) -> Option<PluginId> {
        self.cell(combo).and_then(|c| self.diameter[c])
    }

    pub fn height_plugin(&self, combo: SpeciesTypeCombo) -> Option<PluginId> {
        self.cell(combo).and_then(|c| self.height[c])
    }

    pub fn diameter_plugins(&self) -> &[PluginId] {
        &self.diameter_plugins
    }

    pub fn height_plugins(&self) -> &[PluginId] {
        &self.height_plugins
    }

    /// Every combo in scan order: species-major, type-minor
    pub fn combos(&self) -> impl Iterator<Item = SpeciesTypeCombo> + '_ {
        (0..self.num_species).flat_map(|species| {
            TreeType::ALL
                .into_iter()
                .map(move |tree_type| SpeciesTypeCombo::new(SpeciesId(species as u16), tree_type))
        })
    }

    /// Combos that have a diameter plugin and therefore grow
    pub fn covered_combos(&self) -> impl Iterator<Item = SpeciesTypeCombo> + '_ {
        self.combos()
            .filter(move |combo| self.diameter_plugin(*combo).is_some())
    }
}

/// Build the dispatch table from every registered plugin
///
/// Fails on the first combo claimed twice within the same table; no partly
/// built table is returned.
pub fn build_tables(plugins: &[Box<dyn GrowthPlugin>], num_species: usize) -> GrowthResult<DispatchTable> {
    // First pass: classify and count so the per-kind lists are sized once
    let mut diameter_count = 0;
    let mut height_count = 0;
    for plugin in plugins {
        check_capability(plugin.as_ref())?;
        if plugin.method().sets_diameter() {
            diameter_count += 1;
        } else {
            height_count += 1;
        }
    }
    tracing::debug!(
        "Building growth tables: {} diameter plugins, {} height plugins, {} species",
        diameter_count,
        height_count,
        num_species
    );

    let mut table = DispatchTable::new(num_species);
    table.diameter_plugins.reserve_exact(diameter_count);
    table.height_plugins.reserve_exact(height_count);

    // Second pass: claim cells
    for (idx, plugin) in plugins.iter().enumerate() {
        let id = PluginId(idx);
        let method = plugin.method();

        for &combo in plugin.combos() {
            let Some(cell) = table.cell(combo) else {
                return Err(GrowthError::UnknownSpecies {
                    plugin: plugin.name().to_string(),
                    species: combo.species,
                    num_species,
                });
            };

            let slot = if method.sets_diameter() {
                &mut table.diameter[cell]
            } else {
                &mut table.height[cell]
            };

            match *slot {
                Some(existing) if existing != id => {
                    return Err(GrowthError::Conflict {
                        species: combo.species,
                        tree_type: combo.tree_type,
                        existing: plugins[existing.0].name().to_string(),
                        incoming: plugin.name().to_string(),
                    });
                }
                // A plugin listing the same combo twice is not a conflict
                Some(_) => {}
                None => *slot = Some(id),
            }
        }

        if method.sets_diameter() {
            table.diameter_plugins.push(id);
        } else {
            table.height_plugins.push(id);
        }
    }

    Ok(table)
}

fn check_capability(plugin: &dyn GrowthPlugin) -> GrowthResult<()> {
    let method = plugin.method();
    let has_capability = match method {
        GrowthMethod::DiameterAuto | GrowthMethod::DiameterOnly => plugin.diameter().is_some(),
        GrowthMethod::HeightOnly => plugin.height().is_some(),
    };
    if has_capability {
        Ok(())
    } else {
        Err(GrowthError::CapabilityMismatch {
            plugin: plugin.name().to_string(),
            method,
        })
    }
}
