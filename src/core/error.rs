use thiserror::Error;

use crate::core::types::{SpeciesId, TreeId, TreeType};
use crate::growth::plugin::GrowthMethod;

/// Why a dispatch-table cell fails coverage validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageGap {
    /// Diameter-only plugin without a paired height-only plugin
    MissingHeight,
    /// Height-only plugin without a paired diameter-only plugin
    MissingDiameter,
    /// Height-only plugin on a cell whose height is set automatically
    HeightWithAutoDiameter,
}

impl std::fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageGap::MissingHeight => write!(f, "diameter-only growth has no height-only partner"),
            CoverageGap::MissingDiameter => write!(f, "height-only growth has no diameter-only partner"),
            CoverageGap::HeightWithAutoDiameter => {
                write!(f, "height-only growth paired with automatic-height diameter growth")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum GrowthError {
    // === SETUP ===
    #[error("Growth conflict for species {species} {tree_type}: claimed by both '{existing}' and '{incoming}'")]
    Conflict {
        species: SpeciesId,
        tree_type: TreeType,
        existing: String,
        incoming: String,
    },

    #[error("Incomplete growth coverage for species {species} {tree_type} ('{plugin}'): {gap}")]
    IncompleteCoverage {
        species: SpeciesId,
        tree_type: TreeType,
        plugin: String,
        gap: CoverageGap,
    },

    #[error("Field '{field}' required by '{plugin}' is not registered for species {species} {tree_type}")]
    MissingField {
        field: String,
        species: SpeciesId,
        tree_type: TreeType,
        plugin: String,
    },

    #[error("Plugin '{plugin}' claims species {species}, but only {num_species} species exist")]
    UnknownSpecies {
        plugin: String,
        species: SpeciesId,
        num_species: usize,
    },

    #[error("Plugin '{plugin}' declares {method:?} but does not provide that capability")]
    CapabilityMismatch { plugin: String, method: GrowthMethod },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === RUNTIME ===
    #[error("Plugin '{plugin}' failed on tree {tree}: {message}")]
    Plugin {
        plugin: String,
        tree: TreeId,
        message: String,
    },

    #[error("Plugin '{plugin}' returned non-finite {quantity} delta {value} for tree {tree}")]
    NonFiniteDelta {
        plugin: String,
        tree: TreeId,
        quantity: &'static str,
        value: f64,
    },

    #[error("Tree {0} vanished during the growth pass")]
    UnknownTree(TreeId),

    #[error("Run aborted: a previous timestep failed part-way through")]
    RunAborted,
}

impl GrowthError {
    /// Shorthand for plugins reporting a computation failure
    pub fn plugin(plugin: impl Into<String>, tree: TreeId, message: impl Into<String>) -> Self {
        GrowthError::Plugin {
            plugin: plugin.into(),
            tree,
            message: message.into(),
        }
    }

    /// Setup errors stop a run before its first timestep; everything else
    /// is raised while a timestep is in progress.
    pub fn is_setup_error(&self) -> bool {
        !matches!(
            self,
            GrowthError::Plugin { .. }
                | GrowthError::NonFiniteDelta { .. }
                | GrowthError::UnknownTree(_)
                | GrowthError::RunAborted
        )
    }
}

pub type GrowthResult<T> = std::result::Result<T, GrowthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_names_both_plugins() {
        let err = GrowthError::Conflict {
            species: SpeciesId(2),
            tree_type: TreeType::Adult,
            existing: "first".into(),
            incoming: "second".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("species 2 adult"));
        assert!(msg.contains("'first'"));
        assert!(msg.contains("'second'"));
    }

    #[test]
    fn test_error_classification() {
        assert!(GrowthError::InvalidConfig("x".into()).is_setup_error());
        assert!(!GrowthError::RunAborted.is_setup_error());
        assert!(!GrowthError::plugin("p", TreeId(1), "boom").is_setup_error());
    }

    #[test]
    fn test_json_error_converts() {
        fn parse(text: &str) -> GrowthResult<f64> {
            Ok(serde_json::from_str(text)?)
        }
        let err = parse("not json").unwrap_err();
        assert!(matches!(err, GrowthError::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));
    }
}
