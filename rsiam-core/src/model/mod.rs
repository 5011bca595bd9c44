//! A model is the set of relations contributed by a coupled set of components.
//!
//! Components are built in an order determined by their dependencies: a
//! component that reads a variable is built after the component that declares
//! it. Each component declares its variables and parameters on the shared
//! [`ModelNamespace`](crate::namespace::ModelNamespace) and returns its
//! relations, which are registered under generated names.
//!
//! Variables that no component declares must be supplied as exogenous data
//! when the model is built. If a required variable is missing, the build step
//! fails before any relation is registered.

mod builder;
mod runtime;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use builder::ModelBuilder;
pub use runtime::{BoundViolation, ConstraintResidual, Model};
pub use types::{CGraph, C};
