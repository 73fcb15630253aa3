//! Load stand definitions from TOML files

use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GrowthConfig;
use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::{SpeciesId, SpeciesTypeCombo};
use crate::growth::plugin::{GrowthMethod, GrowthPlugin};
use crate::growth::plugins::{ConstantHeightGrowth, ConstantRadialGrowth, CrowdingGrowth, LightLimitedGrowth};
use crate::rules::schema::{GrowthDef, GrowthKind, StandFile};
use crate::stand::allometry::StandardAllometry;
use crate::stand::init::{populate, InitialCohort};
use crate::stand::light::AmbientLight;
use crate::stand::population::Stand;

/// Read and parse a stand definition file
pub fn load_stand_file(path: &Path) -> GrowthResult<StandFile> {
    let content = fs::read_to_string(path)?;
    let file = parse_stand(&content)?;
    tracing::info!(
        "Loaded {}: {} species, {} growth plugins, {} cohorts",
        path.display(),
        file.species.len(),
        file.growth.len(),
        file.initial.len()
    );
    Ok(file)
}

/// Parse and sanity-check a stand definition
///
/// TOML accepts `nan` and `inf`, so every size the stand is built from is
/// checked for finiteness here.
pub fn parse_stand(content: &str) -> GrowthResult<StandFile> {
    let file: StandFile = toml::from_str(content)?;

    if file.species.is_empty() {
        return Err(GrowthError::InvalidConfig("at least one [[species]] is required".into()));
    }
    if file.species.len() > u16::MAX as usize {
        return Err(GrowthError::InvalidConfig(format!("too many species ({})", file.species.len())));
    }

    let run = &file.run;
    if !(run.plot_size.is_finite() && run.plot_size > 0.0) {
        return Err(GrowthError::InvalidConfig(format!(
            "plot_size must be finite and positive, got {}",
            run.plot_size
        )));
    }
    if !(run.height_epsilon.is_finite() && run.height_epsilon >= 0.0) {
        return Err(GrowthError::InvalidConfig(format!(
            "height_epsilon must be finite and non-negative, got {}",
            run.height_epsilon
        )));
    }

    for (i, species) in file.species.iter().enumerate() {
        if file.species[..i].iter().any(|s| s.name == species.name) {
            return Err(GrowthError::InvalidConfig(format!(
                "species '{}' is declared twice",
                species.name
            )));
        }
        let max_height = species.allometry.max_height;
        if !(max_height.is_finite() && max_height > 0.0) {
            return Err(GrowthError::InvalidConfig(format!(
                "species '{}' needs a finite, positive max_height, got {}",
                species.name, max_height
            )));
        }
        if run.height_epsilon >= max_height {
            return Err(GrowthError::InvalidConfig(format!(
                "height_epsilon ({}) leaves no room under the max_height of '{}' ({})",
                run.height_epsilon, species.name, max_height
            )));
        }
    }

    for cohort in &file.initial {
        let (min, max) = (cohort.min_diameter, cohort.max_diameter);
        if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max) {
            return Err(GrowthError::InvalidConfig(format!(
                "{} {} cohort needs a finite diameter range with 0 <= min <= max, got {}..{}",
                cohort.species, cohort.tree_type, min, max
            )));
        }
    }

    Ok(file)
}

impl StandFile {
    pub fn species_id(&self, name: &str) -> GrowthResult<SpeciesId> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .map(|idx| SpeciesId(idx as u16))
            .ok_or_else(|| GrowthError::UnknownName {
                kind: "species",
                name: name.to_string(),
            })
    }

    pub fn species_name(&self, species: SpeciesId) -> Option<&str> {
        self.species.get(species.index()).map(|s| s.name.as_str())
    }

    pub fn growth_config(&self) -> GrowthConfig {
        GrowthConfig {
            years_per_timestep: self.run.years_per_timestep,
            height_epsilon: self.run.height_epsilon,
            ..GrowthConfig::default()
        }
    }

    pub fn allometry(&self) -> StandardAllometry {
        StandardAllometry::new(self.species.iter().map(|s| s.allometry.clone()).collect())
    }

    pub fn light(&self) -> Option<AmbientLight> {
        self.light.as_ref().map(|l| AmbientLight::new(l.gli))
    }

    pub fn cohorts(&self) -> GrowthResult<Vec<InitialCohort>> {
        self.initial
            .iter()
            .map(|c| {
                Ok(InitialCohort {
                    species: self.species_id(&c.species)?,
                    tree_type: c.tree_type,
                    count: c.count,
                    min_diameter: c.min_diameter,
                    max_diameter: c.max_diameter,
                })
            })
            .collect()
    }

    /// Build the initial stand, seeded from `seed`
    pub fn build_stand(&self, seed: u64) -> GrowthResult<Stand> {
        let mut stand = Stand::new(Box::new(self.allometry()), self.run.plot_size);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        populate(&mut stand, &self.cohorts()?, &mut rng)?;
        Ok(stand)
    }

    /// Instantiate every `[[growth]]` entry, in file order
    pub fn build_plugins(&self) -> GrowthResult<Vec<Box<dyn GrowthPlugin>>> {
        self.growth
            .iter()
            .enumerate()
            .map(|(idx, def)| self.build_plugin(idx, def))
            .collect()
    }

    fn build_plugin(&self, idx: usize, def: &GrowthDef) -> GrowthResult<Box<dyn GrowthPlugin>> {
        let name = def
            .name
            .clone()
            .unwrap_or_else(|| format!("{:?}#{}", def.kind, idx));
        let combos = def
            .combos
            .iter()
            .map(|c| Ok(SpeciesTypeCombo::new(self.species_id(&c.species)?, c.tree_type)))
            .collect::<GrowthResult<Vec<_>>>()?;
        if combos.is_empty() {
            tracing::warn!("Growth plugin '{}' claims no combos and will never run", name);
        }

        let param = |key: &str| {
            def.params.get(key).copied().ok_or_else(|| {
                GrowthError::InvalidConfig(format!("{}: missing parameter '{}'", name, key))
            })
        };

        let plugin: Box<dyn GrowthPlugin> = match def.kind {
            GrowthKind::ConstantRadial => {
                let method = def.method.unwrap_or(GrowthMethod::DiameterAuto);
                Box::new(
                    ConstantRadialGrowth::new(name.clone(), method, combos, param("radial_mm_per_year")?)?
                        .going_last(def.go_last),
                )
            }
            GrowthKind::ConstantHeight => {
                require_method(&name, def, GrowthMethod::HeightOnly)?;
                Box::new(
                    ConstantHeightGrowth::new(name.clone(), combos, param("cm_per_year")?)
                        .going_last(def.go_last),
                )
            }
            GrowthKind::LightLimited => {
                let method = def.method.unwrap_or(GrowthMethod::DiameterAuto);
                Box::new(
                    LightLimitedGrowth::new(
                        name.clone(),
                        method,
                        combos,
                        param("asymptote")?,
                        param("slope")?,
                    )?
                    .going_last(def.go_last),
                )
            }
            GrowthKind::Crowding => {
                require_method(&name, def, GrowthMethod::DiameterAuto)?;
                Box::new(CrowdingGrowth::new(
                    name.clone(),
                    combos,
                    param("max_radial")?,
                    param("coefficient")?,
                    param("radius")?,
                )?)
            }
        };

        tracing::debug!("Built growth plugin '{}' ({:?})", name, plugin.method());
        Ok(plugin)
    }
}

fn require_method(name: &str, def: &GrowthDef, only: GrowthMethod) -> GrowthResult<()> {
    match def.method {
        Some(method) if method != only => Err(GrowthError::CapabilityMismatch {
            plugin: name.to_string(),
            method,
        }),
        _ => Ok(()),
    }
}
