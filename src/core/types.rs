//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Species identifier, dense from zero in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub u16);

impl SpeciesId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a tree within a stand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeId(pub u32);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to a per-tree numeric field issued by the population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldCode(pub u32);

impl FieldCode {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Timestep counter (simulation time unit)
pub type Timestep = u32;

/// Life stage of a tree
///
/// A tree's type changes over a run as it grows through stages, so any
/// lookup keyed by type must use the tree's *current* type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TreeType {
    Seed = 0,
    Seedling = 1,
    Sapling = 2,
    Adult = 3,
    Snag = 4,
}

/// Number of distinct tree types; the width of every species × type table
pub const NUM_TREE_TYPES: usize = 5;

impl TreeType {
    pub const ALL: [TreeType; NUM_TREE_TYPES] = [
        TreeType::Seed,
        TreeType::Seedling,
        TreeType::Sapling,
        TreeType::Adult,
        TreeType::Snag,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            TreeType::Seed => "seed",
            TreeType::Seedling => "seedling",
            TreeType::Sapling => "sapling",
            TreeType::Adult => "adult",
            TreeType::Snag => "snag",
        }
    }

    /// Diameter field a tree of this type is measured (and grown) by
    pub fn diameter_field(&self) -> DiameterField {
        match self {
            TreeType::Seed | TreeType::Seedling | TreeType::Sapling => DiameterField::Diam10,
            TreeType::Adult | TreeType::Snag => DiameterField::Dbh,
        }
    }
}

impl fmt::Display for TreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which diameter measurement a growth calculation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiameterField {
    /// Diameter at 10 cm above ground
    Diam10,
    /// Diameter at breast height (1.35 m)
    Dbh,
}

/// A (species, life stage) pair addressing a subset of the population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesTypeCombo {
    pub species: SpeciesId,
    pub tree_type: TreeType,
}

impl SpeciesTypeCombo {
    pub fn new(species: SpeciesId, tree_type: TreeType) -> Self {
        Self { species, tree_type }
    }
}

impl fmt::Display for SpeciesTypeCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species {} {}", self.species, self.tree_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_type_index_roundtrip() {
        for tree_type in TreeType::ALL {
            assert_eq!(TreeType::from_index(tree_type.index()), Some(tree_type));
        }
        assert_eq!(TreeType::from_index(NUM_TREE_TYPES), None);
    }

    #[test]
    fn test_diameter_field_by_stage() {
        assert_eq!(TreeType::Seedling.diameter_field(), DiameterField::Diam10);
        assert_eq!(TreeType::Sapling.diameter_field(), DiameterField::Diam10);
        assert_eq!(TreeType::Adult.diameter_field(), DiameterField::Dbh);
    }

    #[test]
    fn test_combo_display() {
        let combo = SpeciesTypeCombo::new(SpeciesId(4), TreeType::Sapling);
        assert_eq!(combo.to_string(), "species 4 sapling");
    }

    #[test]
    fn test_tree_type_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            t: TreeType,
        }
        let w: Wrapper = toml::from_str("t = \"seedling\"").unwrap();
        assert_eq!(w.t, TreeType::Seedling);
    }
}
