//! Growth context - orchestrates growth setup and per-timestep updates
//!
//! The context is created once by the simulation driver and owned for the
//! whole run. Setup builds the dispatch table, validates it, registers
//! growth slots and caches height ceilings. Each timestep then runs:
//!
//! 1. Phase A: every plugin's `pre_growth` hook (no tree has grown yet)
//! 2. Phase B: one pass over the live trees, computing and applying
//!    diameter and height increments
//!
//! Any plugin error aborts the timestep and the run; trees already updated
//! in the aborted pass are not rolled back.

use serde::Serialize;

use crate::core::config::GrowthConfig;
use crate::core::error::{CoverageGap, GrowthError, GrowthResult};
use crate::core::types::{DiameterField, FieldCode, SpeciesId, SpeciesTypeCombo, Timestep, TreeId};
use crate::growth::data_members::{DataMembers, MaxHeightTable};
use crate::growth::plugin::{evaluation_order, EvaluationOrder, GrowthMethod, GrowthPlugin, PluginId};
use crate::growth::registry::{build_tables, DispatchTable};
use crate::growth::validate::validate;
use crate::stand::population::{HeightUpdate, TreePopulation};
use crate::stand::tree::Tree;

/// Lifecycle of a growth context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Tables are being built; never observable on a constructed context
    Setup,
    /// Between timesteps
    Ready,
    /// A timestep is in progress, or failed part-way through
    Running,
}

/// Read-only view of the context handed to plugins
#[derive(Clone, Copy)]
pub struct GrowthEnv<'a> {
    config: &'a GrowthConfig,
    tables: &'a DispatchTable,
    members: &'a DataMembers,
    max_heights: &'a MaxHeightTable,
    timestep: Timestep,
}

impl<'a> GrowthEnv<'a> {
    pub fn years_per_timestep(&self) -> f64 {
        self.config.years_per_timestep
    }

    /// Current timestep, starting at 1 for the first step
    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    pub fn tables(&self) -> &'a DispatchTable {
        self.tables
    }

    /// Field code of a sibling behavior's field the plugin declared
    pub fn sibling_field(&self, combo: SpeciesTypeCombo, name: &str) -> Option<FieldCode> {
        self.members.sibling_field(combo, name)
    }

    pub fn growth_field(&self, combo: SpeciesTypeCombo) -> Option<FieldCode> {
        self.members.growth_code(combo)
    }

    pub fn diameter_field(&self, combo: SpeciesTypeCombo) -> DiameterField {
        self.members.diameter_field(combo)
    }

    pub fn max_height(&self, species: SpeciesId) -> f64 {
        self.max_heights.get(species)
    }
}

/// Summary of one timestep's growth pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimestepReport {
    pub timestep: Timestep,
    /// Live trees visited in Phase B
    pub trees_visited: usize,
    /// Trees that had a diameter plugin and grew
    pub trees_grown: usize,
    /// Trees whose combo has no growth
    pub trees_skipped: usize,
    /// Sum of applied diameter increments, cm
    pub diameter_growth: f64,
    /// Sum of explicitly applied height increments, m
    pub height_growth: f64,
    /// Trees whose explicit height was capped at the species ceiling
    pub heights_clamped: usize,
}

/// Owns the plugins and setup-time tables for a run
pub struct GrowthContext {
    config: GrowthConfig,
    state: CoordinatorState,
    plugins: Vec<Box<dyn GrowthPlugin>>,
    tables: DispatchTable,
    members: DataMembers,
    max_heights: MaxHeightTable,
    timestep: Timestep,
}

impl GrowthContext {
    /// Run setup once: build and validate tables, register fields
    ///
    /// Species count comes from the population's allometry. A setup error
    /// leaves no context behind; the run cannot start.
    pub fn setup(
        config: GrowthConfig,
        mut plugins: Vec<Box<dyn GrowthPlugin>>,
        population: &mut dyn TreePopulation,
    ) -> GrowthResult<Self> {
        tracing::debug!(state = ?CoordinatorState::Setup, "Growth setup starting with {} plugins", plugins.len());
        config.validate().map_err(GrowthError::InvalidConfig)?;

        let num_species = population.allometry().num_species();
        let tables = build_tables(&plugins, num_species)?;
        validate(&tables, &plugins)?;

        for plugin in plugins.iter_mut() {
            plugin.register_fields(population)?;
        }
        let members = DataMembers::register(&tables, &plugins, population, &config)?;
        let max_heights =
            MaxHeightTable::from_allometry(population.allometry(), num_species, config.height_epsilon)?;

        tracing::info!(
            "Growth ready: {} plugins over {} species ({} growing combos)",
            plugins.len(),
            num_species,
            tables.covered_combos().count()
        );

        Ok(Self {
            config,
            state: CoordinatorState::Ready,
            plugins,
            tables,
            members,
            max_heights,
            timestep: 0,
        })
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Number of completed or attempted timesteps
    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn tables(&self) -> &DispatchTable {
        &self.tables
    }

    pub fn members(&self) -> &DataMembers {
        &self.members
    }

    pub fn max_heights(&self) -> &MaxHeightTable {
        &self.max_heights
    }

    pub fn plugin_name(&self, id: PluginId) -> Option<&str> {
        self.plugins.get(id.0).map(|p| p.name())
    }

    pub fn env(&self) -> GrowthEnv<'_> {
        GrowthEnv {
            config: &self.config,
            tables: &self.tables,
            members: &self.members,
            max_heights: &self.max_heights,
            timestep: self.timestep,
        }
    }

    /// Advance every tree by one timestep of growth
    pub fn run_timestep(&mut self, population: &mut dyn TreePopulation) -> GrowthResult<TimestepReport> {
        if self.state == CoordinatorState::Running {
            return Err(GrowthError::RunAborted);
        }
        self.state = CoordinatorState::Running;
        self.timestep += 1;

        let Self {
            config,
            plugins,
            tables,
            members,
            max_heights,
            timestep,
            ..
        } = self;
        let env = GrowthEnv {
            config,
            tables,
            members,
            max_heights,
            timestep: *timestep,
        };

        // Phase A
        for plugin in plugins.iter_mut() {
            plugin.pre_growth(&env, population)?;
        }

        // Phase B
        let mut report = TimestepReport {
            timestep: env.timestep,
            ..TimestepReport::default()
        };
        for id in population.live_trees() {
            report.trees_visited += 1;
            grow_tree(plugins, &env, population, id, &mut report)?;
        }

        self.state = CoordinatorState::Ready;
        tracing::info!(
            "Timestep {}: grew {} of {} trees (+{:.3} cm diameter, +{:.3} m explicit height)",
            report.timestep,
            report.trees_grown,
            report.trees_visited,
            report.diameter_growth,
            report.height_growth
        );
        Ok(report)
    }
}

/// Increments computed for one tree before anything is written
struct TreeGrowth {
    diameter_delta: f64,
    height_delta: Option<f64>,
    growth_rate: f64,
}

fn grow_tree(
    plugins: &[Box<dyn GrowthPlugin>],
    env: &GrowthEnv<'_>,
    population: &mut dyn TreePopulation,
    id: TreeId,
    report: &mut TimestepReport,
) -> GrowthResult<()> {
    let tree = population.tree(id).ok_or(GrowthError::UnknownTree(id))?;
    let combo = tree.combo();
    let Some(diameter_id) = env.tables.diameter_plugin(combo) else {
        report.trees_skipped += 1;
        return Ok(());
    };

    let diameter_plugin = plugins[diameter_id.0].as_ref();
    let method = diameter_plugin.method();
    let growth = compute_growth(plugins, diameter_plugin, env, combo, tree)?;
    let species = tree.species();
    let old_height = tree.height();

    // Everything below writes; the tree is not read again
    if let Some(code) = env.members.growth_code(combo) {
        population
            .tree_mut(id)
            .ok_or(GrowthError::UnknownTree(id))?
            .set_field(code, growth.growth_rate);
    }

    let height_update = match method {
        GrowthMethod::DiameterAuto => HeightUpdate::Allometric {
            max: env.max_heights.get(species),
        },
        GrowthMethod::DiameterOnly | GrowthMethod::HeightOnly => HeightUpdate::Keep,
    };
    population.apply_diameter_delta(id, growth.diameter_delta, height_update)?;

    if let Some(height_delta) = growth.height_delta {
        let target = old_height + height_delta;
        let height = env.max_heights.clamp(species, target);
        if height < target {
            report.heights_clamped += 1;
        }
        population.set_height(id, height)?;
        report.height_growth += height - old_height;
    }

    report.trees_grown += 1;
    report.diameter_growth += growth.diameter_delta;
    Ok(())
}

fn compute_growth(
    plugins: &[Box<dyn GrowthPlugin>],
    diameter_plugin: &dyn GrowthPlugin,
    env: &GrowthEnv<'_>,
    combo: SpeciesTypeCombo,
    tree: &Tree,
) -> GrowthResult<TreeGrowth> {
    let capability = |plugin: &dyn GrowthPlugin| GrowthError::CapabilityMismatch {
        plugin: plugin.name().to_string(),
        method: plugin.method(),
    };
    let diameter = diameter_plugin
        .diameter()
        .ok_or_else(|| capability(diameter_plugin))?;
    let d_name = diameter_plugin.name();

    let (diameter_delta, height_delta) = match diameter_plugin.method() {
        GrowthMethod::DiameterAuto => {
            let d = finite(d_name, tree.id(), "diameter", diameter.diameter_delta(tree, 0.0, env)?)?;
            (d, None)
        }
        GrowthMethod::DiameterOnly | GrowthMethod::HeightOnly => {
            let height_id = env.tables.height_plugin(combo).ok_or_else(|| {
                GrowthError::IncompleteCoverage {
                    species: combo.species,
                    tree_type: combo.tree_type,
                    plugin: d_name.to_string(),
                    gap: CoverageGap::MissingHeight,
                }
            })?;
            let height_plugin = plugins[height_id.0].as_ref();
            let height = height_plugin.height().ok_or_else(|| capability(height_plugin))?;
            let h_name = height_plugin.name();

            match evaluation_order(diameter_plugin.goes_last(), height_plugin.goes_last()) {
                EvaluationOrder::DiameterFirst => {
                    let d = finite(d_name, tree.id(), "diameter", diameter.diameter_delta(tree, 0.0, env)?)?;
                    let h = finite(h_name, tree.id(), "height", height.height_delta(tree, d, env)?)?;
                    (d, Some(h))
                }
                EvaluationOrder::HeightFirst => {
                    let h = finite(h_name, tree.id(), "height", height.height_delta(tree, 0.0, env)?)?;
                    let d = finite(d_name, tree.id(), "diameter", diameter.diameter_delta(tree, h, env)?)?;
                    (d, Some(h))
                }
            }
        }
    };

    let growth_rate = diameter.growth_rate_value(tree, diameter_delta, env);
    Ok(TreeGrowth {
        diameter_delta,
        height_delta,
        growth_rate,
    })
}

fn finite(plugin: &str, tree: TreeId, quantity: &'static str, value: f64) -> GrowthResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GrowthError::NonFiniteDelta {
            plugin: plugin.to_string(),
            tree,
            quantity,
            value,
        })
    }
}
