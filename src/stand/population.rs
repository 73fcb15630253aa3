//! Tree population: the collaborator the growth engine reads and writes

use ahash::AHashMap;

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::{FieldCode, SpeciesId, SpeciesTypeCombo, TreeId, TreeType};
use crate::stand::allometry::{Allometry, BREAST_HEIGHT};
use crate::stand::tree::Tree;

/// How a diameter change carries over to height
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightUpdate {
    /// Height is left alone; a paired height calculation sets it
    Keep,
    /// Height is recomputed allometrically from the new diameter, then
    /// capped at `max`
    Allometric { max: f64 },
}

/// Interface the growth engine uses to reach the tree population
pub trait TreePopulation {
    /// Live trees in iteration order
    ///
    /// Returns a fresh list on every call, so enumeration can be restarted.
    fn live_trees(&self) -> Vec<TreeId>;

    fn tree(&self, id: TreeId) -> Option<&Tree>;

    fn tree_mut(&mut self, id: TreeId) -> Option<&mut Tree>;

    /// Register a named numeric field for one species/type combo
    ///
    /// Registering the same name twice for a combo returns the existing code.
    fn register_field(&mut self, name: &str, combo: SpeciesTypeCombo) -> FieldCode;

    /// Code of an already registered field, `None` if nobody registered it
    fn field_code(&self, name: &str, combo: SpeciesTypeCombo) -> Option<FieldCode>;

    fn allometry(&self) -> &dyn Allometry;

    /// Add `delta` to the tree's stage diameter, keeping the other
    /// diameter consistent
    fn apply_diameter_delta(&mut self, id: TreeId, delta: f64, height: HeightUpdate) -> GrowthResult<()>;

    fn set_height(&mut self, id: TreeId, height: f64) -> GrowthResult<()>;
}

/// In-memory stand of trees on a square plot
pub struct Stand {
    trees: Vec<Tree>,
    index: AHashMap<TreeId, usize>,
    next_id: u32,
    field_codes: AHashMap<(String, SpeciesTypeCombo), FieldCode>,
    field_names: Vec<String>,
    allometry: Box<dyn Allometry>,
    /// Side length of the plot, metres
    pub plot_size: f64,
}

impl Stand {
    pub fn new(allometry: Box<dyn Allometry>, plot_size: f64) -> Self {
        Self {
            trees: Vec::new(),
            index: AHashMap::new(),
            next_id: 1,
            field_codes: AHashMap::new(),
            field_names: Vec::new(),
            allometry,
            plot_size,
        }
    }

    pub fn num_species(&self) -> usize {
        self.allometry.num_species()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> impl Iterator<Item = &Tree> + '_ {
        self.trees.iter()
    }

    /// Add a tree whose height follows from its diameter
    pub fn plant(
        &mut self,
        species: SpeciesId,
        tree_type: TreeType,
        position: (f64, f64),
        diameter: f64,
    ) -> TreeId {
        let height = self.allometry.height(species, tree_type, diameter);
        self.plant_with_height(species, tree_type, position, diameter, height)
    }

    /// Add a tree with an explicit height
    ///
    /// `diameter` is the stage diameter: diam10 for juveniles, dbh otherwise.
    pub fn plant_with_height(
        &mut self,
        species: SpeciesId,
        tree_type: TreeType,
        position: (f64, f64),
        diameter: f64,
        height: f64,
    ) -> TreeId {
        let id = TreeId(self.next_id);
        self.next_id += 1;

        let (diam10, dbh) = self.derive_sizes(species, tree_type, diameter);
        self.index.insert(id, self.trees.len());
        self.trees
            .push(Tree::new(id, species, tree_type, position, diam10, dbh, height));
        id
    }

    /// Name a field code was registered under
    pub fn field_name(&self, code: FieldCode) -> Option<&str> {
        self.field_names.get(code.index()).map(String::as_str)
    }

    /// Move trees into the next life stage once they outgrow the current one
    ///
    /// Seedlings reaching breast height become saplings; saplings reaching
    /// the species' minimum adult dbh become adults. Returns how many
    /// trees changed stage.
    pub fn advance_life_stages(&mut self) -> usize {
        let mut promoted = 0;
        for tree in self.trees.iter_mut() {
            let species = tree.species();
            match tree.tree_type() {
                TreeType::Seedling if tree.height() >= BREAST_HEIGHT => {
                    let dbh = self.allometry.dbh_from_diam10(species, tree.diam10());
                    tree.set_sizes(tree.diam10(), dbh);
                    tree.set_tree_type(TreeType::Sapling);
                    promoted += 1;
                }
                TreeType::Sapling if tree.dbh() >= self.allometry.min_adult_dbh(species) => {
                    tree.set_tree_type(TreeType::Adult);
                    promoted += 1;
                }
                _ => {}
            }
        }
        if promoted > 0 {
            tracing::debug!("{} trees advanced a life stage", promoted);
        }
        promoted
    }

    fn derive_sizes(&self, species: SpeciesId, tree_type: TreeType, diameter: f64) -> (f64, f64) {
        match tree_type {
            TreeType::Seed | TreeType::Seedling => (diameter, 0.0),
            TreeType::Sapling => (diameter, self.allometry.dbh_from_diam10(species, diameter)),
            TreeType::Adult | TreeType::Snag => {
                (self.allometry.diam10_from_dbh(species, diameter), diameter)
            }
        }
    }
}

impl TreePopulation for Stand {
    fn live_trees(&self) -> Vec<TreeId> {
        self.trees
            .iter()
            .filter(|t| t.is_alive())
            .map(|t| t.id())
            .collect()
    }

    fn tree(&self, id: TreeId) -> Option<&Tree> {
        self.index.get(&id).map(|&idx| &self.trees[idx])
    }

    fn tree_mut(&mut self, id: TreeId) -> Option<&mut Tree> {
        let idx = *self.index.get(&id)?;
        self.trees.get_mut(idx)
    }

    fn register_field(&mut self, name: &str, combo: SpeciesTypeCombo) -> FieldCode {
        if let Some(code) = self.field_code(name, combo) {
            return code;
        }
        let code = FieldCode(self.field_names.len() as u32);
        self.field_names.push(name.to_string());
        self.field_codes.insert((name.to_string(), combo), code);
        tracing::debug!("Registered field '{}' for {} as {:?}", name, combo, code);
        code
    }

    fn field_code(&self, name: &str, combo: SpeciesTypeCombo) -> Option<FieldCode> {
        self.field_codes.get(&(name.to_string(), combo)).copied()
    }

    fn allometry(&self) -> &dyn Allometry {
        self.allometry.as_ref()
    }

    fn apply_diameter_delta(&mut self, id: TreeId, delta: f64, height: HeightUpdate) -> GrowthResult<()> {
        let idx = *self.index.get(&id).ok_or(GrowthError::UnknownTree(id))?;
        let tree = &self.trees[idx];
        let species = tree.species();
        let tree_type = tree.tree_type();
        let diameter = tree.diameter() + delta;

        let (diam10, dbh) = self.derive_sizes(species, tree_type, diameter);
        let height = match height {
            HeightUpdate::Keep => None,
            HeightUpdate::Allometric { max } => {
                Some(self.allometry.height(species, tree_type, diameter).min(max))
            }
        };

        let tree = &mut self.trees[idx];
        tree.set_sizes(diam10, dbh);
        if let Some(height) = height {
            tree.set_height(height);
        }
        Ok(())
    }

    fn set_height(&mut self, id: TreeId, height: f64) -> GrowthResult<()> {
        let tree = self.tree_mut(id).ok_or(GrowthError::UnknownTree(id))?;
        tree.set_height(height);
        Ok(())
    }
}
