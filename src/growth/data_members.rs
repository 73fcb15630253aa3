//! Per-combo field codes and per-species height ceilings
//!
//! Everything here is resolved once at setup and read-only afterwards.

use ahash::AHashMap;

use crate::core::config::GrowthConfig;
use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::{DiameterField, FieldCode, SpeciesId, SpeciesTypeCombo, NUM_TREE_TYPES};
use crate::growth::plugin::GrowthPlugin;
use crate::growth::registry::DispatchTable;
use crate::stand::allometry::Allometry;
use crate::stand::population::TreePopulation;

/// Field codes the growth engine and its plugins use, per combo
#[derive(Debug, Clone)]
pub struct DataMembers {
    num_species: usize,
    /// Growth-rate slot, present for every combo with a diameter plugin
    growth_codes: Vec<Option<FieldCode>>,
    /// Sibling fields plugins declared, per combo then field name
    siblings: AHashMap<SpeciesTypeCombo, AHashMap<String, FieldCode>>,
}

impl DataMembers {
    /// Register growth slots and resolve every sibling field plugins need
    pub fn register(
        table: &DispatchTable,
        plugins: &[Box<dyn GrowthPlugin>],
        population: &mut dyn TreePopulation,
        config: &GrowthConfig,
    ) -> GrowthResult<Self> {
        let num_species = table.num_species();
        let mut growth_codes = vec![None; num_species * NUM_TREE_TYPES];

        for (cell, combo) in table.combos().enumerate() {
            if table.diameter_plugin(combo).is_some() {
                growth_codes[cell] = Some(population.register_field(&config.growth_field_name, combo));
            }
        }

        let mut siblings: AHashMap<SpeciesTypeCombo, AHashMap<String, FieldCode>> = AHashMap::new();
        for plugin in plugins {
            for &field in plugin.required_fields() {
                for &combo in plugin.combos() {
                    let code = population.field_code(field, combo).ok_or_else(|| {
                        GrowthError::MissingField {
                            field: field.to_string(),
                            species: combo.species,
                            tree_type: combo.tree_type,
                            plugin: plugin.name().to_string(),
                        }
                    })?;
                    siblings.entry(combo).or_default().insert(field.to_string(), code);
                }
            }
        }

        tracing::debug!(
            "Registered {} growth slots and {} sibling fields",
            growth_codes.iter().flatten().count(),
            siblings.values().map(|fields| fields.len()).sum::<usize>()
        );

        Ok(Self {
            num_species,
            growth_codes,
            siblings,
        })
    }

    /// Growth-rate slot for a combo; `None` for combos that do not grow
    pub fn growth_code(&self, combo: SpeciesTypeCombo) -> Option<FieldCode> {
        let species = combo.species.index();
        if species >= self.num_species {
            return None;
        }
        self.growth_codes[species * NUM_TREE_TYPES + combo.tree_type.index()]
    }

    /// Diameter a combo's growth calculations work on
    pub fn diameter_field(&self, combo: SpeciesTypeCombo) -> DiameterField {
        combo.tree_type.diameter_field()
    }

    /// Code of a sibling field a plugin declared in `required_fields`
    pub fn sibling_field(&self, combo: SpeciesTypeCombo, name: &str) -> Option<FieldCode> {
        self.siblings.get(&combo)?.get(name).copied()
    }
}

/// Per-species height ceiling: asymptotic height minus epsilon
#[derive(Debug, Clone)]
pub struct MaxHeightTable {
    ceilings: Vec<f64>,
}

impl MaxHeightTable {
    /// Fails unless every ceiling is finite and positive
    pub fn from_allometry(allometry: &dyn Allometry, num_species: usize, epsilon: f64) -> GrowthResult<Self> {
        let ceilings = (0..num_species)
            .map(|s| {
                let species = SpeciesId(s as u16);
                let max_height = allometry.max_height(species);
                let ceiling = max_height - epsilon;
                if ceiling.is_finite() && ceiling > 0.0 {
                    Ok(ceiling)
                } else {
                    Err(GrowthError::InvalidConfig(format!(
                        "species {} has max height {} and epsilon {}, leaving no valid height ceiling",
                        species, max_height, epsilon
                    )))
                }
            })
            .collect::<GrowthResult<Vec<_>>>()?;
        Ok(Self { ceilings })
    }

    pub fn get(&self, species: SpeciesId) -> f64 {
        self.ceilings
            .get(species.index())
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// Clamp a height to the species ceiling
    pub fn clamp(&self, species: SpeciesId, height: f64) -> f64 {
        height.min(self.get(species))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TreeType;
    use crate::growth::registry::build_tables;
    use crate::growth::testing::FixedPlugin;
    use crate::stand::allometry::{SpeciesAllometry, StandardAllometry};
    use crate::stand::population::Stand;

    fn stand(num_species: usize) -> Stand {
        let species = (0..num_species)
            .map(|_| SpeciesAllometry::with_max_height(30.0))
            .collect();
        Stand::new(Box::new(StandardAllometry::new(species)), 100.0)
    }

    fn combo(species: u16, tree_type: TreeType) -> SpeciesTypeCombo {
        SpeciesTypeCombo::new(SpeciesId(species), tree_type)
    }

    #[test]
    fn test_growth_slot_only_for_covered_combos() {
        let adult = combo(0, TreeType::Adult);
        let plugins: Vec<Box<dyn GrowthPlugin>> =
            vec![Box::new(FixedPlugin::diameter_auto("d", vec![adult], 0.5))];
        let table = build_tables(&plugins, 2).unwrap();
        let mut stand = stand(2);

        let members = DataMembers::register(&table, &plugins, &mut stand, &GrowthConfig::default()).unwrap();
        let code = members.growth_code(adult).unwrap();
        assert_eq!(stand.field_code("Growth", adult), Some(code));
        assert_eq!(members.growth_code(combo(0, TreeType::Sapling)), None);
        assert_eq!(members.growth_code(combo(1, TreeType::Adult)), None);
        assert_eq!(members.growth_code(combo(7, TreeType::Adult)), None);
    }

    #[test]
    fn test_missing_sibling_field_fails() {
        let sapling = combo(0, TreeType::Sapling);
        let plugins: Vec<Box<dyn GrowthPlugin>> =
            vec![Box::new(FixedPlugin::diameter_auto("lit", vec![sapling], 0.5).requiring("Light"))];
        let table = build_tables(&plugins, 1).unwrap();
        let mut stand = stand(1);

        match DataMembers::register(&table, &plugins, &mut stand, &GrowthConfig::default()) {
            Err(GrowthError::MissingField { field, species, tree_type, plugin }) => {
                assert_eq!(field, "Light");
                assert_eq!(species, SpeciesId(0));
                assert_eq!(tree_type, TreeType::Sapling);
                assert_eq!(plugin, "lit");
            }
            other => panic!("expected missing field, got {:?}", other),
        }

        let light = stand.register_field("Light", sapling);
        let members = DataMembers::register(&table, &plugins, &mut stand, &GrowthConfig::default()).unwrap();
        assert_eq!(members.sibling_field(sapling, "Light"), Some(light));
        assert_eq!(members.sibling_field(sapling, "Crowding"), None);
        assert_eq!(members.sibling_field(combo(0, TreeType::Adult), "Light"), None);
    }

    #[test]
    fn test_diameter_field_by_stage() {
        let members = DataMembers {
            num_species: 1,
            growth_codes: vec![None; NUM_TREE_TYPES],
            siblings: AHashMap::new(),
        };
        assert_eq!(members.diameter_field(combo(0, TreeType::Seedling)), DiameterField::Diam10);
        assert_eq!(members.diameter_field(combo(0, TreeType::Sapling)), DiameterField::Diam10);
        assert_eq!(members.diameter_field(combo(0, TreeType::Adult)), DiameterField::Dbh);
    }

    #[test]
    fn test_max_height_table_subtracts_epsilon() {
        let allometry = StandardAllometry::new(vec![
            SpeciesAllometry::with_max_height(30.0),
            SpeciesAllometry::with_max_height(18.0),
        ]);
        let table = MaxHeightTable::from_allometry(&allometry, 2, 0.001).unwrap();
        assert_eq!(table.get(SpeciesId(0)), 30.0 - 0.001);
        assert_eq!(table.clamp(SpeciesId(1), 25.0), 18.0 - 0.001);
        assert_eq!(table.clamp(SpeciesId(1), 10.0), 10.0);
    }

    #[test]
    fn test_max_height_table_rejects_unusable_ceilings() {
        for (max_height, epsilon) in [(f64::NAN, 0.001), (f64::INFINITY, 0.001), (10.0, 10.0), (10.0, 12.0)] {
            let allometry = StandardAllometry::new(vec![SpeciesAllometry::with_max_height(max_height)]);
            assert!(matches!(
                MaxHeightTable::from_allometry(&allometry, 1, epsilon),
                Err(GrowthError::InvalidConfig(_))
            ));
        }
    }
}
