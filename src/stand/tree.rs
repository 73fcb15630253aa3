//! Individual tree record

use serde::Serialize;

use crate::core::types::{DiameterField, FieldCode, SpeciesId, SpeciesTypeCombo, TreeId, TreeType};

/// A single tree in the stand
///
/// Size fields are private so that every change goes through the
/// population, which keeps the derived diameter and height consistent.
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    id: TreeId,
    species: SpeciesId,
    tree_type: TreeType,
    /// Plot coordinates in metres
    pub x: f64,
    pub y: f64,
    /// Diameter at 10 cm, cm
    diam10: f64,
    /// Diameter at breast height, cm (zero for trees shorter than 1.35 m)
    dbh: f64,
    /// Height, m
    height: f64,
    /// Dynamically registered numeric fields, indexed by `FieldCode`
    fields: Vec<f64>,
}

impl Tree {
    pub(crate) fn new(
        id: TreeId,
        species: SpeciesId,
        tree_type: TreeType,
        position: (f64, f64),
        diam10: f64,
        dbh: f64,
        height: f64,
    ) -> Self {
        Self {
            id,
            species,
            tree_type,
            x: position.0,
            y: position.1,
            diam10,
            dbh,
            height,
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn species(&self) -> SpeciesId {
        self.species
    }

    pub fn tree_type(&self) -> TreeType {
        self.tree_type
    }

    pub fn combo(&self) -> SpeciesTypeCombo {
        SpeciesTypeCombo::new(self.species, self.tree_type)
    }

    pub fn diam10(&self) -> f64 {
        self.diam10
    }

    pub fn dbh(&self) -> f64 {
        self.dbh
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The diameter this tree's life stage is measured by
    pub fn diameter(&self) -> f64 {
        self.diameter_of(self.tree_type.diameter_field())
    }

    pub fn diameter_of(&self, field: DiameterField) -> f64 {
        match field {
            DiameterField::Diam10 => self.diam10,
            DiameterField::Dbh => self.dbh,
        }
    }

    /// Basal area in square metres, from dbh
    pub fn basal_area(&self) -> f64 {
        let radius_m = self.dbh / 200.0;
        std::f64::consts::PI * radius_m * radius_m
    }

    pub fn is_alive(&self) -> bool {
        self.tree_type != TreeType::Snag
    }

    /// Read a registered field; `None` if it was never written for this tree
    pub fn field(&self, code: FieldCode) -> Option<f64> {
        self.fields.get(code.index()).copied()
    }

    pub fn set_field(&mut self, code: FieldCode, value: f64) {
        let idx = code.index();
        if idx >= self.fields.len() {
            self.fields.resize(idx + 1, 0.0);
        }
        self.fields[idx] = value;
    }

    pub(crate) fn set_sizes(&mut self, diam10: f64, dbh: f64) {
        self.diam10 = diam10;
        self.dbh = dbh;
    }

    pub(crate) fn set_height(&mut self, height: f64) {
        self.height = height;
    }

    pub(crate) fn set_tree_type(&mut self, tree_type: TreeType) {
        self.tree_type = tree_type;
    }

    pub(crate) fn distance_sq(&self, other: &Tree) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}
