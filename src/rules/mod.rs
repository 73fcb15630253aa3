//! Stand definitions loaded from TOML

mod loader;
pub mod schema;

pub use loader::{load_stand_file, parse_stand};
pub use schema::{CohortDef, ComboDef, GrowthDef, GrowthKind, LightSection, RunSection, SpeciesDef, StandFile};
