//! Coverage validation for a populated dispatch table

use crate::core::error::{CoverageGap, GrowthError, GrowthResult};
use crate::growth::plugin::{GrowthMethod, GrowthPlugin, PluginId};
use crate::growth::registry::DispatchTable;

/// Check that every cell's diameter and height plugins pair up
///
/// Cells are scanned species-major, type-minor and the first offending cell
/// is reported, so error messages are reproducible.
pub fn validate(table: &DispatchTable, plugins: &[Box<dyn GrowthPlugin>]) -> GrowthResult<()> {
    let plugin = |id: PluginId| {
        plugins.get(id.0).ok_or_else(|| {
            GrowthError::InvalidConfig(format!(
                "dispatch table references plugin #{}, but only {} plugins were given",
                id.0,
                plugins.len()
            ))
        })
    };

    for combo in table.combos() {
        let diameter = table.diameter_plugin(combo);
        let height = table.height_plugin(combo);

        let gap = match (diameter, height) {
            (None, None) => None,
            (Some(d), None) if plugin(d)?.method() == GrowthMethod::DiameterOnly => {
                Some((d, CoverageGap::MissingHeight))
            }
            (Some(_), None) => None,
            (None, Some(h)) => Some((h, CoverageGap::MissingDiameter)),
            (Some(d), Some(h)) => match plugin(d)?.method() {
                GrowthMethod::DiameterAuto => Some((h, CoverageGap::HeightWithAutoDiameter)),
                _ => None,
            },
        };

        if let Some((id, gap)) = gap {
            return Err(GrowthError::IncompleteCoverage {
                species: combo.species,
                tree_type: combo.tree_type,
                plugin: plugin(id)?.name().to_string(),
                gap,
            });
        }
    }

    Ok(())
}
