//! Stand Growth - plugin-dispatched tree growth for forest stand simulation

pub mod core;
pub mod growth;
pub mod rules;
pub mod stand;
