//! Stand collaborators
//!
//! The tree population, its allometry and a constant light provider. The
//! growth engine only sees these through the `TreePopulation` and
//! `Allometry` traits.

pub mod allometry;
pub mod init;
pub mod light;
pub mod population;
pub mod tree;

pub use allometry::{Allometry, SpeciesAllometry, StandardAllometry, BREAST_HEIGHT};
pub use init::{populate, InitialCohort};
pub use light::{AmbientLight, LIGHT_FIELD};
pub use population::{HeightUpdate, Stand, TreePopulation};
pub use tree::Tree;
