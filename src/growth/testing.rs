//! Scripted plugin for unit tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::{GrowthError, GrowthResult};
use crate::core::types::SpeciesTypeCombo;
use crate::growth::context::GrowthEnv;
use crate::growth::plugin::{DiameterGrower, GrowthMethod, GrowthPlugin, HeightGrower};
use crate::stand::population::TreePopulation;
use crate::stand::tree::Tree;

/// Returns a fixed delta and records the prior deltas it was handed
pub struct FixedPlugin {
    name: String,
    method: GrowthMethod,
    combos: Vec<SpeciesTypeCombo>,
    delta: f64,
    goes_last: bool,
    capable: bool,
    fail: bool,
    required: Vec<&'static str>,
    pub priors: Rc<RefCell<Vec<f64>>>,
    pub pre_growth_calls: Rc<RefCell<u32>>,
}

impl FixedPlugin {
    fn new(name: &str, method: GrowthMethod, combos: Vec<SpeciesTypeCombo>, delta: f64) -> Self {
        Self {
            name: name.to_string(),
            method,
            combos,
            delta,
            goes_last: false,
            capable: true,
            fail: false,
            required: Vec::new(),
            priors: Rc::new(RefCell::new(Vec::new())),
            pre_growth_calls: Rc::new(RefCell::new(0)),
        }
    }

    pub fn diameter_auto(name: &str, combos: Vec<SpeciesTypeCombo>, delta: f64) -> Self {
        Self::new(name, GrowthMethod::DiameterAuto, combos, delta)
    }

    pub fn diameter_only(name: &str, combos: Vec<SpeciesTypeCombo>, delta: f64) -> Self {
        Self::new(name, GrowthMethod::DiameterOnly, combos, delta)
    }

    pub fn height_only(name: &str, combos: Vec<SpeciesTypeCombo>, delta: f64) -> Self {
        Self::new(name, GrowthMethod::HeightOnly, combos, delta)
    }

    pub fn going_last(mut self) -> Self {
        self.goes_last = true;
        self
    }

    pub fn without_capability(mut self) -> Self {
        self.capable = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn requiring(mut self, field: &'static str) -> Self {
        self.required.push(field);
        self
    }

    fn result(&self, tree: &Tree, prior: f64) -> GrowthResult<f64> {
        self.priors.borrow_mut().push(prior);
        if self.fail {
            return Err(GrowthError::plugin(&self.name, tree.id(), "scripted failure"));
        }
        Ok(self.delta)
    }
}

impl GrowthPlugin for FixedPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self) -> GrowthMethod {
        self.method
    }

    fn combos(&self) -> &[SpeciesTypeCombo] {
        &self.combos
    }

    fn goes_last(&self) -> bool {
        self.goes_last
    }

    fn required_fields(&self) -> &[&'static str] {
        &self.required
    }

    fn pre_growth(&mut self, _env: &GrowthEnv<'_>, _population: &mut dyn TreePopulation) -> GrowthResult<()> {
        *self.pre_growth_calls.borrow_mut() += 1;
        Ok(())
    }

    fn diameter(&self) -> Option<&dyn DiameterGrower> {
        (self.capable && self.method.sets_diameter()).then_some(self as &dyn DiameterGrower)
    }

    fn height(&self) -> Option<&dyn HeightGrower> {
        (self.capable && self.method == GrowthMethod::HeightOnly).then_some(self as &dyn HeightGrower)
    }
}

impl DiameterGrower for FixedPlugin {
    fn diameter_delta(&self, tree: &Tree, prior_height_delta: f64, _env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        self.result(tree, prior_height_delta)
    }
}

impl HeightGrower for FixedPlugin {
    fn height_delta(&self, tree: &Tree, prior_diameter_delta: f64, _env: &GrowthEnv<'_>) -> GrowthResult<f64> {
        self.result(tree, prior_diameter_delta)
    }
}
