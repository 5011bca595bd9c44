//! Constraint assembly for a regional economic growth and climate damage
//! integrated assessment model.
//!
//! A [`ModelConfig`] selects the time grid, regions, damage module and
//! parameters. [`assemble`] combines it with regional damage coefficients and
//! exogenous data into a [`Model`](rsiam_core::model::Model) whose constraints
//! are evaluated by an external solver.

pub mod assembly;
pub mod config;

pub use assembly::{assemble, ExogenousData};
pub use config::ModelConfig;
pub use rsiam_components;
pub use rsiam_core;
