//! Neighbourhood crowding growth
//!
//! Phase A computes, for every claimed tree, the basal area of its live
//! neighbours per hectare and caches it in the plugin's own `"Crowding"`
//! field. Phase B then reads that cache, so every tree sees its neighbours
//! as they were before anyone grew this timestep.

use ahash::AHashMap;

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::{FieldCode, SpeciesTypeCombo, TreeId};
use crate::growth::context::GrowthEnv;
use crate::growth::plugin::{diameter_delta_from_radial, DiameterGrower, GrowthMethod, GrowthPlugin};
use crate::stand::population::TreePopulation;
use crate::stand::tree::Tree;

pub const CROWDING_FIELD: &str = "Crowding";

/// `radial = max_radial * exp(-coefficient * crowding)`
#[derive(Debug, Clone)]
pub struct CrowdingGrowth {
    name: String,
    combos: Vec<SpeciesTypeCombo>,
    /// Radial growth of an uncrowded tree, mm/yr
    pub max_radial: f64,
    /// Sensitivity to neighbour basal area, ha/m²
    pub coefficient: f64,
    /// Neighbourhood radius, m
    pub radius: f64,
    codes: AHashMap<SpeciesTypeCombo, FieldCode>,
}

impl CrowdingGrowth {
    pub fn new(
        name: impl Into<String>,
        combos: Vec<SpeciesTypeCombo>,
        max_radial: f64,
        coefficient: f64,
        radius: f64,
    ) -> GrowthResult<Self> {
        let name = name.into();
        if radius <= 0.0 {
            return Err(GrowthError::InvalidConfig(format!(
                "{}: neighbourhood radius ({}) must be positive",
                name, radius
            )));
        }
        Ok(Self {
            name,
            combos,
            max_radial,
            coefficient,
            radius,
            codes: AHashMap::new(),
        })
    }

    /// Neighbour basal area (m²/ha) within `radius` of every tree we grow
    fn crowding(&self, population: &dyn TreePopulation) -> Vec<(TreeId, FieldCode, f64)> {
        let live: Vec<&Tree> = population
            .live_trees()
            .into_iter()
            .filter_map(|id| population.tree(id))
            .collect();
        let r2 = self.radius * self.radius;
        let area_ha = std::f64::consts::PI * r2 / 10_000.0;

        live.iter()
            .filter_map(|tree| {
                let code = *self.codes.get(&tree.combo())?;
                let basal_area: f64 = live
                    .iter()
                    .filter(|other| other.id() != tree.id() && tree.distance_sq(other) <= r2)
                    .map(|other| other.basal_area())
                    .sum();
                Some((tree.id(), code, basal_area / area_ha))
            })
            .collect()
    }
}

impl GrowthPlugin for CrowdingGrowth {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> GrowthMethod {
        GrowthMethod::DiameterAuto
    }

    fn combos(&self) -> &[SpeciesTypeCombo] {
        &self.combos
    }

    fn register_fields(&mut self, population: &mut dyn TreePopulation) -> GrowthResult<()> {
        for &combo in &self.combos {
            let code = population.register_field(CROWDING_FIELD, combo);
            self.codes.insert(combo, code);
        }
        Ok(())
    }

    fn pre_growth(&mut self, _env: &GrowthEnv<'_>, population: &mut dyn TreePopulation) -> GrowthResult<()> {
        let values = self.crowding(population);
        for (id, code, value) in values {
            population
                .tree_mut(id)
                .ok_or(GrowthError::UnknownTree(id))?
                .set_field(code, value);
        }
        Ok(())
    }

    fn diameter(&self) -> Option<&dyn DiameterGrower> {
        Some(self)
    }
}

impl DiameterGrower for CrowdingGrowth {
    fn diameter_delta(&self, tree: &Tree, _prior_height_delta: f64, env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        let crowding = self
            .codes
            .get(&tree.combo())
            .and_then(|&code| tree.field(code))
            .ok_or_else(|| GrowthError::plugin(&self.name, tree.id(), "crowding was not computed"))?;
        let radial = self.max_radial * (-self.coefficient * crowding).exp();
        Ok(diameter_delta_from_radial(radial, env.years_per_timestep()))
    }
}
