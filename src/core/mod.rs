pub mod config;
pub mod error;
pub mod types;

pub use config::GrowthConfig;
pub use error::{CoverageGap, GrowthError, GrowthResult};
pub use types::{
    DiameterField, FieldCode, SpeciesId, SpeciesTypeCombo, Timestep, TreeId, TreeType,
    NUM_TREE_TYPES,
};
