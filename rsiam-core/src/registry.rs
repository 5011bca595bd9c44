//! Registration of relations into a model namespace.
//!
//! Each registered relation gets a name of the form `constraint_<n>`, where
//! `n` is the number of relations already registered on the namespace. Names
//! are therefore unique per namespace and depend only on registration order.
//! Registration takes `&mut ModelNamespace`, so two registrations can never
//! race on the same namespace.

use crate::namespace::ModelNamespace;
use crate::relation::{Relation, RelationSet};
use log::debug;

/// A relation attached to a namespace under its generated name.
#[derive(Debug, Clone)]
pub struct RegisteredConstraint {
    pub name: String,
    pub relation: Relation,
}

/// Attach `relation` to the namespace and return its generated name.
pub fn register(namespace: &mut ModelNamespace, relation: Relation) -> String {
    let name = format!("constraint_{}", namespace.constraints().len());
    debug!(
        "Registering {} ({:?}: {})",
        name,
        relation.kind(),
        relation.label()
    );
    namespace.push_constraint(RegisteredConstraint {
        name: name.clone(),
        relation,
    });
    name
}

/// Register every relation of a component, in [`RelationSet`] order.
pub fn register_all(namespace: &mut ModelNamespace, relations: RelationSet) -> Vec<String> {
    relations
        .into_iter()
        .map(|relation| register(namespace, relation))
        .collect()
}
