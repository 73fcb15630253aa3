//! Seeded generation of an initial stand

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::{SpeciesId, TreeType};
use crate::stand::population::Stand;

/// A group of trees of one species and stage scattered over the plot
#[derive(Debug, Clone)]
pub struct InitialCohort {
    pub species: SpeciesId,
    pub tree_type: TreeType,
    pub count: u32,
    /// Stage diameter range, cm
    pub min_diameter: f64,
    pub max_diameter: f64,
}

impl InitialCohort {
    /// Diameter range must satisfy `0 <= min <= max`, both finite
    pub fn check(&self) -> GrowthResult<()> {
        let (min, max) = (self.min_diameter, self.max_diameter);
        if min.is_finite() && max.is_finite() && 0.0 <= min && min <= max {
            Ok(())
        } else {
            Err(GrowthError::InvalidConfig(format!(
                "species {} {} cohort has diameter range {}..{}",
                self.species, self.tree_type, min, max
            )))
        }
    }
}

/// Plant every cohort at uniformly random positions
///
/// Diameters are drawn uniformly from each cohort's range and heights follow
/// allometrically. Returns the number of trees planted. Nothing is planted
/// unless the plot and every cohort range are finite and well ordered.
pub fn populate(stand: &mut Stand, cohorts: &[InitialCohort], rng: &mut ChaCha8Rng) -> GrowthResult<usize> {
    let size = stand.plot_size;
    if !(size.is_finite() && size > 0.0) {
        return Err(GrowthError::InvalidConfig(format!(
            "plot size must be finite and positive, got {}",
            size
        )));
    }
    for cohort in cohorts {
        cohort.check()?;
    }

    let mut planted = 0;
    for cohort in cohorts {
        for _ in 0..cohort.count {
            let x = rng.gen_range(0.0..size);
            let y = rng.gen_range(0.0..size);
            let diameter = if cohort.max_diameter > cohort.min_diameter {
                rng.gen_range(cohort.min_diameter..cohort.max_diameter)
            } else {
                cohort.min_diameter
            };
            stand.plant(cohort.species, cohort.tree_type, (x, y), diameter);
            planted += 1;
        }
    }

    tracing::info!("Planted {} trees on a {:.0} m plot", planted, size);
    Ok(planted)
}
