//! Fixed-increment growth, mostly useful as a baseline and in tests

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::SpeciesTypeCombo;
use crate::growth::context::GrowthEnv;
use crate::growth::plugin::{
    diameter_delta_from_radial, DiameterGrower, GrowthMethod, GrowthPlugin, HeightGrower,
};
use crate::stand::tree::Tree;

/// Grows every claimed tree by the same radial increment
#[derive(Debug, Clone)]
pub struct ConstantRadialGrowth {
    name: String,
    method: GrowthMethod,
    combos: Vec<SpeciesTypeCombo>,
    /// Radial increment, mm/yr
    pub radial_mm_per_year: f64,
    goes_last: bool,
}

impl ConstantRadialGrowth {
    /// `method` must be one of the diameter methods
    pub fn new(
        name: impl Into<String>,
        method: GrowthMethod,
        combos: Vec<SpeciesTypeCombo>,
        radial_mm_per_year: f64,
    ) -> GrowthResult<Self> {
        let name = name.into();
        if !method.sets_diameter() {
            return Err(GrowthError::CapabilityMismatch { plugin: name, method });
        }
        Ok(Self {
            name,
            method,
            combos,
            radial_mm_per_year,
            goes_last: false,
        })
    }

    pub fn going_last(mut self, goes_last: bool) -> Self {
        self.goes_last = goes_last;
        self
    }
}

impl GrowthPlugin for ConstantRadialGrowth {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> GrowthMethod {
        self.method
    }

    fn combos(&self) -> &[SpeciesTypeCombo] {
        &self.combos
    }

    fn goes_last(&self) -> bool {
        self.goes_last
    }

    fn diameter(&self) -> Option<&dyn DiameterGrower> {
        Some(self)
    }
}

impl DiameterGrower for ConstantRadialGrowth {
    fn diameter_delta(&self, _tree: &Tree, _prior_height_delta: f64, env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        Ok(diameter_delta_from_radial(self.radial_mm_per_year, env.years_per_timestep()))
    }
}

/// Adds the same height increment to every claimed tree
#[derive(Debug, Clone)]
pub struct ConstantHeightGrowth {
    name: String,
    combos: Vec<SpeciesTypeCombo>,
    /// Height increment, cm/yr
    pub cm_per_year: f64,
    goes_last: bool,
}

impl ConstantHeightGrowth {
    pub fn new(name: impl Into<String>, combos: Vec<SpeciesTypeCombo>, cm_per_year: f64) -> Self {
        Self {
            name: name.into(),
            combos,
            cm_per_year,
            goes_last: false,
        }
    }

    pub fn going_last(mut self, goes_last: bool) -> Self {
        self.goes_last = goes_last;
        self
    }
}

impl GrowthPlugin for ConstantHeightGrowth {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> GrowthMethod {
        GrowthMethod::HeightOnly
    }

    fn combos(&self) -> &[SpeciesTypeCombo] {
        &self.combos
    }

    fn goes_last(&self) -> bool {
        self.goes_last
    }

    fn height(&self) -> Option<&dyn HeightGrower> {
        Some(self)
    }
}

impl HeightGrower for ConstantHeightGrowth {
    fn height_delta(&self, _tree: &Tree, _prior_diameter_delta: f64, env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        Ok(self.cm_per_year / 100.0 * env.years_per_timestep())
    }
}
