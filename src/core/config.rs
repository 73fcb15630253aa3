//! Growth configuration with documented constants
//!
//! All tuning numbers the growth engine needs are collected here. The config
//! is owned by the `GrowthContext`; there is no process-wide copy.

use serde::{Deserialize, Serialize};

/// Configuration for the growth orchestration engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Length of one timestep in years
    ///
    /// Plugins scale their annual increments by this, and the default
    /// growth-rate conversion divides by it to report an annual value.
    pub years_per_timestep: f64,

    /// Gap kept below each species' asymptotic height (metres)
    ///
    /// Heights are clamped to `max_height - height_epsilon` so that inverse
    /// allometric functions, which diverge at the asymptote, stay finite.
    pub height_epsilon: f64,

    /// Symbolic name of the per-tree slot that publishes growth rates
    ///
    /// Mortality and other downstream behaviors look the slot up by this
    /// name.
    pub growth_field_name: String,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            years_per_timestep: 1.0,
            height_epsilon: 0.001,
            growth_field_name: "Growth".to_string(),
        }
    }
}

impl GrowthConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_years_per_timestep(mut self, years: f64) -> Self {
        self.years_per_timestep = years;
        self
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if !(self.years_per_timestep.is_finite() && self.years_per_timestep > 0.0) {
            return Err(format!(
                "years_per_timestep ({}) must be positive",
                self.years_per_timestep
            ));
        }

        if !(self.height_epsilon.is_finite() && self.height_epsilon >= 0.0) {
            return Err(format!(
                "height_epsilon ({}) must be non-negative",
                self.height_epsilon
            ));
        }

        if self.growth_field_name.trim().is_empty() {
            return Err("growth_field_name must not be empty".into());
        }

        Ok(())
    }
}
