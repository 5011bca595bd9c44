//! Core traits and functionality for assembling the constraint system of a
//! regional economic growth and climate damage integrated assessment model.
//!
//! Components declare variables and parameters on a shared
//! [`namespace::ModelNamespace`] and contribute [`relation::Relation`]s, which
//! are registered under unique generated names. The assembled system is
//! handed to an external solver through [`model::Model`].

pub mod coefficients;
pub mod component;
pub mod economics;
pub mod errors;
pub mod model;
pub mod namespace;
pub mod registry;
pub mod relation;
pub mod timeseries;
pub mod units;
