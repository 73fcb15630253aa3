//! The growth plugin contract
//!
//! Architecture: capability composition
//! - `GrowthPlugin` carries what every plugin declares (name, method, combos,
//!   ordering hint, setup and Phase A hooks)
//! - `DiameterGrower` / `HeightGrower` are the two calculation capabilities;
//!   a plugin exposes whichever it holds through `diameter()` / `height()`

use serde::{Deserialize, Serialize};

use crate::core::error::GrowthResult;
use crate::core::types::SpeciesTypeCombo;
use crate::growth::context::GrowthEnv;
use crate::stand::population::TreePopulation;
use crate::stand::tree::Tree;

/// How a plugin's results are applied to a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthMethod {
    /// Sets diameter; height follows allometrically
    DiameterAuto,
    /// Sets diameter; a paired `HeightOnly` plugin sets height
    DiameterOnly,
    /// Sets height; a paired `DiameterOnly` plugin sets diameter
    HeightOnly,
}

impl GrowthMethod {
    /// True for the methods that fill the diameter table
    pub fn sets_diameter(&self) -> bool {
        matches!(self, GrowthMethod::DiameterAuto | GrowthMethod::DiameterOnly)
    }
}

/// Index of a plugin within the context that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(pub usize);

/// Diameter growth capability
pub trait DiameterGrower {
    /// Diameter increment for this timestep, cm
    ///
    /// `prior_height_delta` is the paired height plugin's result when that
    /// plugin ran first, otherwise zero.
    fn diameter_delta(&self, tree: &Tree, prior_height_delta: f64, env: &GrowthEnv<'_>) -> GrowthResult<f64>;

    /// Value published in the tree's growth slot for a diameter increment
    ///
    /// Defaults to annual radial growth in mm/yr.
    fn growth_rate_value(&self, _tree: &Tree, diameter_delta: f64, env: &GrowthEnv<'_>) -> f64 {
        radial_growth_mm_per_year(diameter_delta, env.years_per_timestep())
    }
}

/// Height growth capability
pub trait HeightGrower {
    /// Height increment for this timestep, m
    ///
    /// `prior_diameter_delta` is the paired diameter plugin's result when
    /// that plugin ran first, otherwise zero.
    fn height_delta(&self, tree: &Tree, prior_diameter_delta: f64, env: &GrowthEnv<'_>) -> GrowthResult<f64>;
}

/// A pluggable growth calculator
pub trait GrowthPlugin {
    fn name(&self) -> &str;

    fn method(&self) -> GrowthMethod;

    /// Species/type combos this plugin is responsible for
    fn combos(&self) -> &[SpeciesTypeCombo];

    /// Ask to run after the paired plugin and receive its result
    fn goes_last(&self) -> bool {
        false
    }

    /// Fields other behaviors must have registered for every claimed combo
    fn required_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Register the plugin's own per-tree fields; called once at setup
    fn register_fields(&mut self, _population: &mut dyn TreePopulation) -> GrowthResult<()> {
        Ok(())
    }

    /// Phase A hook, run before any tree grows this timestep
    ///
    /// May write the plugin's own fields, never tree sizes. No ordering
    /// between plugins' hooks is guaranteed.
    fn pre_growth(&mut self, _env: &GrowthEnv<'_>, _population: &mut dyn TreePopulation) -> GrowthResult<()> {
        Ok(())
    }

    fn diameter(&self) -> Option<&dyn DiameterGrower> {
        None
    }

    fn height(&self) -> Option<&dyn HeightGrower> {
        None
    }
}

/// Convert a diameter increment (cm per timestep) to radial growth (mm/yr)
pub fn radial_growth_mm_per_year(diameter_delta: f64, years_per_timestep: f64) -> f64 {
    diameter_delta * 10.0 / 2.0 / years_per_timestep
}

/// Convert radial growth (mm/yr) to a diameter increment (cm per timestep)
pub fn diameter_delta_from_radial(radial_mm_per_year: f64, years_per_timestep: f64) -> f64 {
    radial_mm_per_year * 2.0 / 10.0 * years_per_timestep
}

/// Which half of a diameter/height pair is evaluated first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOrder {
    DiameterFirst,
    HeightFirst,
}

/// Resolve the order of a paired diameter-only/height-only evaluation
///
/// If exactly one plugin asks to go last, the other goes first. When the
/// flags agree, diameter goes first.
pub fn evaluation_order(diameter_goes_last: bool, height_goes_last: bool) -> EvaluationOrder {
    if diameter_goes_last && !height_goes_last {
        EvaluationOrder::HeightFirst
    } else {
        EvaluationOrder::DiameterFirst
    }
}
