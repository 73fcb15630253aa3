//! Built-in growth plugins

pub mod constant;
pub mod crowding;
pub mod light_limited;

pub use constant::{ConstantHeightGrowth, ConstantRadialGrowth};
pub use crowding::{CrowdingGrowth, CROWDING_FIELD};
pub use light_limited::LightLimitedGrowth;
