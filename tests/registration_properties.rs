//! Property tests for dispatch table construction
//!
//! Plugins are registered in random orders; the table must never hold two
//! plugins in a cell, and a double claim must be reported whatever the
//! order.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use stand_growth::core::{GrowthError, GrowthResult, SpeciesId, SpeciesTypeCombo, TreeType};
use stand_growth::growth::{
    build_tables, DiameterGrower, GrowthEnv, GrowthMethod, GrowthPlugin, HeightGrower, PluginId,
};
use stand_growth::stand::Tree;

const NUM_SPECIES: u16 = 3;

#[derive(Debug, Clone)]
struct Claim {
    name: String,
    method: GrowthMethod,
    combos: Vec<SpeciesTypeCombo>,
}

impl GrowthPlugin for Claim {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> GrowthMethod {
        self.method
    }

    fn combos(&self) -> &[SpeciesTypeCombo] {
        &self.combos
    }

    fn diameter(&self) -> Option<&dyn DiameterGrower> {
        self.method.sets_diameter().then_some(self as &dyn DiameterGrower)
    }

    fn height(&self) -> Option<&dyn HeightGrower> {
        (!self.method.sets_diameter()).then_some(self as &dyn HeightGrower)
    }
}

impl DiameterGrower for Claim {
    fn diameter_delta(&self, _tree: &Tree, _prior: f64, _env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        Ok(0.0)
    }
}

impl HeightGrower for Claim {
    fn height_delta(&self, _tree: &Tree, _prior: f64, _env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        Ok(0.0)
    }
}

fn method() -> impl Strategy<Value = GrowthMethod> {
    prop_oneof![
        Just(GrowthMethod::DiameterAuto),
        Just(GrowthMethod::DiameterOnly),
        Just(GrowthMethod::HeightOnly),
    ]
}

fn combo() -> impl Strategy<Value = SpeciesTypeCombo> {
    (0..NUM_SPECIES, 0..TreeType::ALL.len())
        .prop_map(|(species, t)| SpeciesTypeCombo::new(SpeciesId(species), TreeType::ALL[t]))
}

/// Plugins plus a random registration order over them
fn registrations() -> impl Strategy<Value = (Vec<Claim>, Vec<usize>)> {
    prop::collection::vec((method(), prop::collection::vec(combo(), 1..5)), 1..7)
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (method, combos))| Claim {
                    name: format!("plugin{}", i),
                    method,
                    combos,
                })
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|claims| {
            let order: Vec<usize> = (0..claims.len()).collect();
            (Just(claims), Just(order).prop_shuffle())
        })
}

/// Like `registrations`, but later plugins drop combos already taken in
/// their table, so no cell is claimed twice
fn disjoint_registrations() -> impl Strategy<Value = (Vec<Claim>, Vec<usize>)> {
    registrations().prop_map(|(claims, order)| {
        let mut taken = HashSet::new();
        let claims = claims
            .into_iter()
            .map(|mut claim| {
                let kind = claim.method.sets_diameter();
                claim.combos.retain(|&combo| taken.insert((kind, combo)));
                claim
            })
            .collect();
        (claims, order)
    })
}

/// Cells claimed by more than one plugin, per table
fn double_claims(claims: &[Claim]) -> HashSet<(bool, SpeciesTypeCombo)> {
    let mut owners: HashMap<(bool, SpeciesTypeCombo), HashSet<&str>> = HashMap::new();
    for claim in claims {
        for &combo in &claim.combos {
            owners
                .entry((claim.method.sets_diameter(), combo))
                .or_default()
                .insert(&claim.name);
        }
    }
    owners
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(cell, _)| cell)
        .collect()
}

fn in_order(claims: &[Claim], order: &[usize]) -> Vec<Box<dyn GrowthPlugin>> {
    order
        .iter()
        .map(|&i| Box::new(claims[i].clone()) as Box<dyn GrowthPlugin>)
        .collect()
}

proptest! {
    #[test]
    fn prop_conflicts_found_in_any_order((claims, order) in registrations()) {
        let conflicts = double_claims(&claims);
        let result = build_tables(&in_order(&claims, &order), NUM_SPECIES as usize);

        match result {
            Err(GrowthError::Conflict { species, tree_type, existing, incoming }) => {
                prop_assert!(!conflicts.is_empty());
                prop_assert_ne!(existing, incoming);
                let combo = SpeciesTypeCombo::new(species, tree_type);
                prop_assert!(
                    conflicts.contains(&(true, combo)) || conflicts.contains(&(false, combo))
                );
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
            Ok(_) => prop_assert!(conflicts.is_empty()),
        }
    }

    #[test]
    fn prop_every_cell_has_its_single_claimant((claims, order) in disjoint_registrations()) {
        let plugins = in_order(&claims, &order);
        let table = build_tables(&plugins, NUM_SPECIES as usize).unwrap();

        for (position, plugin) in plugins.iter().enumerate() {
            for &combo in plugin.combos() {
                let cell = if plugin.method().sets_diameter() {
                    table.diameter_plugin(combo)
                } else {
                    table.height_plugin(combo)
                };
                prop_assert_eq!(cell, Some(PluginId(position)));
            }
        }
    }

    #[test]
    fn prop_registration_order_does_not_change_the_table((claims, order) in disjoint_registrations()) {
        let identity: Vec<usize> = (0..claims.len()).collect();
        let reference = in_order(&claims, &identity);
        let shuffled = in_order(&claims, &order);
        let a = build_tables(&reference, NUM_SPECIES as usize).unwrap();
        let b = build_tables(&shuffled, NUM_SPECIES as usize).unwrap();

        let name_of = |plugins: &[Box<dyn GrowthPlugin>], id: Option<PluginId>| {
            id.map(|id| plugins[id.0].name().to_string())
        };
        for combo in a.combos() {
            prop_assert_eq!(
                name_of(&reference, a.diameter_plugin(combo)),
                name_of(&shuffled, b.diameter_plugin(combo))
            );
            prop_assert_eq!(
                name_of(&reference, a.height_plugin(combo)),
                name_of(&shuffled, b.height_plugin(combo))
            );
        }
    }
}
