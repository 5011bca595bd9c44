//! Component parameters
//!
//! Each component has an associated parameters struct with defaults taken
//! from the DICE/RICE calibration. Parameters deserialise from partial tables,
//! so a configuration only needs to name the values it changes.

mod damages;
mod economics;

pub use damages::{DamageCoefficients, DamageParameters};
pub use economics::GrowthParameters;
