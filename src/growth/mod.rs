//! Growth orchestration
//!
//! Plugins declare which (species, tree type) combos they grow and how.
//! Setup builds dense dispatch tables from those claims, validates coverage
//! and registers per-tree fields; `GrowthContext::run_timestep` then drives
//! every live tree through its diameter and height plugins.

pub mod context;
pub mod data_members;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{CoordinatorState, GrowthContext, GrowthEnv, TimestepReport};
pub use data_members::{DataMembers, MaxHeightTable};
pub use plugin::{
    diameter_delta_from_radial, evaluation_order, radial_growth_mm_per_year, DiameterGrower,
    EvaluationOrder, GrowthMethod, GrowthPlugin, HeightGrower, PluginId,
};
pub use registry::{build_tables, DispatchTable};
pub use validate::validate;
