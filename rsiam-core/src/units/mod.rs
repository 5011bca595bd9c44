//! Units of configured quantities.
//!
//! - [`registry`]: known units with their dimensions and conversion factors
//! - [`parser`]: quantity expressions such as `20 GtCO2/yr`
//! - [`resolver`]: conversion of configured quantities into model units

pub mod parser;
pub mod registry;
pub mod resolver;

pub use parser::Quantity;
pub use registry::{Dimension, UnitInfo, UnitRegistry, UNIT_REGISTRY};
pub use resolver::{QuantityResolver, QuantitySpec};
