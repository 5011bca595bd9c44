//! Components for rsiam
//!
//! This crate provides the economic growth and climate damage components of
//! the model. Each component declares its variables and parameters on the
//! shared namespace and contributes the relations between them.
//!
//! # Parameters
//!
//! Each component has an associated parameters struct in the `parameters`
//! module with defaults from the DICE/RICE calibration.

pub mod components;
pub mod parameters;
