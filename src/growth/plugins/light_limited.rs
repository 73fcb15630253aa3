//! Michaelis-Menten radial growth driven by available light

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::SpeciesTypeCombo;
use crate::growth::context::GrowthEnv;
use crate::growth::plugin::{diameter_delta_from_radial, DiameterGrower, GrowthMethod, GrowthPlugin};
use crate::stand::light::LIGHT_FIELD;
use crate::stand::tree::Tree;

/// `radial = a * gli / (a / s + gli)`
///
/// `a` is the asymptotic radial growth (mm/yr) and `s` the slope of the
/// response at zero light.
#[derive(Debug, Clone)]
pub struct LightLimitedGrowth {
    name: String,
    method: GrowthMethod,
    combos: Vec<SpeciesTypeCombo>,
    pub asymptote: f64,
    pub slope: f64,
    goes_last: bool,
}

const REQUIRED: [&str; 1] = [LIGHT_FIELD];

impl LightLimitedGrowth {
    pub fn new(
        name: impl Into<String>,
        method: GrowthMethod,
        combos: Vec<SpeciesTypeCombo>,
        asymptote: f64,
        slope: f64,
    ) -> GrowthResult<Self> {
        let name = name.into();
        if !method.sets_diameter() {
            return Err(GrowthError::CapabilityMismatch { plugin: name, method });
        }
        if asymptote <= 0.0 || slope <= 0.0 {
            return Err(GrowthError::InvalidConfig(format!(
                "{}: asymptote ({}) and slope ({}) must be positive",
                name, asymptote, slope
            )));
        }
        Ok(Self {
            name,
            method,
            combos,
            asymptote,
            slope,
            goes_last: false,
        })
    }

    pub fn going_last(mut self, goes_last: bool) -> Self {
        self.goes_last = goes_last;
        self
    }

    /// Radial growth (mm/yr) at a light level
    pub fn radial_growth(&self, gli: f64) -> f64 {
        let gli = gli.max(0.0);
        self.asymptote * gli / (self.asymptote / self.slope + gli)
    }
}

impl GrowthPlugin for LightLimitedGrowth {
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

    fn required_fields(&self) -> &[&'static str] {
        &REQUIRED
    }

    fn diameter(&self) -> Option<&dyn DiameterGrower> {
        Some(self)
    }
}

impl DiameterGrower for LightLimitedGrowth {
    fn diameter_delta(&self, tree: &Tree, _prior_height_delta: f64, env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        let gli = env
            .sibling_field(tree.combo(), LIGHT_FIELD)
            .and_then(|code| tree.field(code))
            .ok_or_else(|| GrowthError::plugin(&self.name, tree.id(), "no light value for tree"))?;
        Ok(diameter_delta_from_radial(self.radial_growth(gli), env.years_per_timestep()))
    }
}
