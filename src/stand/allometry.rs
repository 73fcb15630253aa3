//! Height-diameter relationships per species

use serde::Deserialize;

use crate::core::types::{SpeciesId, TreeType};

/// Breast height in metres; trees below it have no dbh
pub const BREAST_HEIGHT: f64 = 1.35;

/// Allometry collaborator consulted by the stand and the growth engine
pub trait Allometry {
    fn num_species(&self) -> usize;

    /// Asymptotic height of a species, metres
    fn max_height(&self, species: SpeciesId) -> f64;

    /// Height from the diameter a tree of `tree_type` is measured by
    fn height(&self, species: SpeciesId, tree_type: TreeType, diameter: f64) -> f64;

    fn dbh_from_diam10(&self, species: SpeciesId, diam10: f64) -> f64;

    fn diam10_from_dbh(&self, species: SpeciesId, dbh: f64) -> f64;

    /// Dbh at which a sapling becomes an adult, cm
    fn min_adult_dbh(&self, species: SpeciesId) -> f64;
}

/// Allometric parameters for a single species
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesAllometry {
    /// Asymptotic height, m
    pub max_height: f64,
    /// Slope of the asymptotic adult height curve (1/cm)
    #[serde(default = "default_adult_slope")]
    pub adult_slope: f64,
    /// Height gained per cm of diam10 for juveniles, m/cm
    #[serde(default = "default_juvenile_slope")]
    pub juvenile_slope: f64,
    #[serde(default = "default_juvenile_intercept")]
    pub juvenile_intercept: f64,
    /// dbh = diam10_to_dbh_intercept + diam10_to_dbh_slope * diam10
    #[serde(default = "default_diam10_to_dbh_slope")]
    pub diam10_to_dbh_slope: f64,
    #[serde(default)]
    pub diam10_to_dbh_intercept: f64,
    #[serde(default = "default_min_adult_dbh")]
    pub min_adult_dbh: f64,
}

fn default_adult_slope() -> f64 {
    0.03
}

fn default_juvenile_slope() -> f64 {
    0.5
}

fn default_juvenile_intercept() -> f64 {
    0.1
}

fn default_diam10_to_dbh_slope() -> f64 {
    0.8
}

fn default_min_adult_dbh() -> f64 {
    10.0
}

impl SpeciesAllometry {
    pub fn with_max_height(max_height: f64) -> Self {
        Self {
            max_height,
            adult_slope: default_adult_slope(),
            juvenile_slope: default_juvenile_slope(),
            juvenile_intercept: default_juvenile_intercept(),
            diam10_to_dbh_slope: default_diam10_to_dbh_slope(),
            diam10_to_dbh_intercept: 0.0,
            min_adult_dbh: default_min_adult_dbh(),
        }
    }
}

/// Linear juvenile / asymptotic adult allometry
///
/// Juveniles: `h = intercept + slope * diam10`.
/// Adults: `h = 1.35 + (max - 1.35) * (1 - exp(-slope * dbh))`.
#[derive(Debug, Clone, Default)]
pub struct StandardAllometry {
    species: Vec<SpeciesAllometry>,
}

impl StandardAllometry {
    pub fn new(species: Vec<SpeciesAllometry>) -> Self {
        Self { species }
    }

    fn params(&self, species: SpeciesId) -> Option<&SpeciesAllometry> {
        self.species.get(species.index())
    }
}

impl Allometry for StandardAllometry {
    fn num_species(&self) -> usize {
        self.species.len()
    }

    fn max_height(&self, species: SpeciesId) -> f64 {
        self.params(species).map_or(0.0, |p| p.max_height)
    }

    fn height(&self, species: SpeciesId, tree_type: TreeType, diameter: f64) -> f64 {
        let Some(p) = self.params(species) else {
            return 0.0;
        };
        let h = match tree_type {
            TreeType::Seed | TreeType::Seedling | TreeType::Sapling => {
                p.juvenile_intercept + p.juvenile_slope * diameter
            }
            TreeType::Adult | TreeType::Snag => {
                BREAST_HEIGHT
                    + (p.max_height - BREAST_HEIGHT) * (1.0 - (-p.adult_slope * diameter).exp())
            }
        };
        h.max(0.0).min(p.max_height)
    }

    fn dbh_from_diam10(&self, species: SpeciesId, diam10: f64) -> f64 {
        self.params(species).map_or(0.0, |p| {
            (p.diam10_to_dbh_intercept + p.diam10_to_dbh_slope * diam10).max(0.0)
        })
    }

    fn diam10_from_dbh(&self, species: SpeciesId, dbh: f64) -> f64 {
        self.params(species).map_or(0.0, |p| {
            if p.diam10_to_dbh_slope <= 0.0 {
                dbh
            } else {
                ((dbh - p.diam10_to_dbh_intercept) / p.diam10_to_dbh_slope).max(0.0)
            }
        })
    }

    fn min_adult_dbh(&self, species: SpeciesId) -> f64 {
        self.params(species).map_or(f64::INFINITY, |p| p.min_adult_dbh)
    }
}
