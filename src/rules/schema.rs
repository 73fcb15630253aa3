//! Stand definition file layout
//!
//! ```toml
//! [run]
//! timesteps = 20
//! years_per_timestep = 1.0
//! seed = 42
//!
//! [[species]]
//! name = "ACRU"
//! max_height = 28.0
//!
//! [light]
//! gli = 60.0
//!
//! [[growth]]
//! kind = "light_limited"
//! method = "diameter_auto"
//! combos = [{ species = "ACRU", type = "adult" }]
//! params = { asymptote = 4.0, slope = 0.2 }
//!
//! [[initial]]
//! species = "ACRU"
//! type = "adult"
//! count = 50
//! min_diameter = 10.0
//! max_diameter = 40.0
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::types::TreeType;
use crate::growth::plugin::GrowthMethod;
use crate::stand::allometry::SpeciesAllometry;

#[derive(Debug, Clone, Deserialize)]
pub struct StandFile {
    #[serde(default)]
    pub run: RunSection,
    pub species: Vec<SpeciesDef>,
    #[serde(default)]
    pub light: Option<LightSection>,
    #[serde(default)]
    pub growth: Vec<GrowthDef>,
    #[serde(default)]
    pub initial: Vec<CohortDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSection {
    pub timesteps: u32,
    pub years_per_timestep: f64,
    pub height_epsilon: f64,
    pub seed: u64,
    /// Plot side length, m
    pub plot_size: f64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            timesteps: 10,
            years_per_timestep: 1.0,
            height_epsilon: 0.001,
            seed: 12345,
            plot_size: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    #[serde(flatten)]
    pub allometry: SpeciesAllometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightSection {
    /// Global light index, percent of full sun
    pub gli: f64,
}

/// Built-in growth plugin kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthKind {
    ConstantRadial,
    ConstantHeight,
    LightLimited,
    Crowding,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrowthDef {
    pub kind: GrowthKind,
    /// Defaults to `<kind>#<position>`
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to the kind's natural method
    #[serde(default)]
    pub method: Option<GrowthMethod>,
    #[serde(default)]
    pub go_last: bool,
    pub combos: Vec<ComboDef>,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComboDef {
    pub species: String,
    #[serde(rename = "type")]
    pub tree_type: TreeType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CohortDef {
    pub species: String,
    #[serde(rename = "type")]
    pub tree_type: TreeType,
    pub count: u32,
    pub min_diameter: f64,
    pub max_diameter: f64,
}
