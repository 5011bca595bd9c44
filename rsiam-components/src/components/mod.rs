//! Components of the growth and damage model
//!
//! - `cobb_douglas`: Output, capital, consumption and utility
//! - `damages`: Climate damages and adaptation

mod cobb_douglas;
mod damages;

pub use cobb_douglas::CobbDouglas;
pub use damages::DamageAdaptation;
