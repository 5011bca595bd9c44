//! Validation functions for model building.

use crate::component::{Component, RequirementDefinition};
use crate::errors::{RSIAMError, RSIAMResult};
use crate::namespace::ModelNamespace;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

use super::types::CGraph;

/// The component type name, taken from its `Debug` representation.
pub(crate) fn component_name(component: &dyn Component) -> String {
    let debug = format!("{:?}", component);
    debug
        .split(['{', ' ', '('])
        .next()
        .unwrap_or("UnknownComponent")
        .to_string()
}

/// A variable declared by a component, with the node that declares it.
pub(crate) struct Producer {
    pub node: NodeIndex,
    pub component: String,
    pub definition: RequirementDefinition,
}

/// Resolve where an input comes from.
///
/// Returns the producing node when another component declares the input, or
/// `None` when it is satisfied by exogenous data already on the namespace.
pub(crate) fn verify_input(
    namespace: &ModelNamespace,
    producers: &HashMap<String, Producer>,
    input: &RequirementDefinition,
    component: &str,
) -> RSIAMResult<Option<NodeIndex>> {
    if let Some(producer) = producers.get(&input.name) {
        if producer.definition.index != input.index {
            return Err(RSIAMError::IndexMismatch {
                name: input.name.clone(),
                declared: format!("{} by {}", producer.definition.index, producer.component),
                requested: format!("{} by {}", input.index, component),
            });
        }
        return Ok(Some(producer.node));
    }

    match namespace.index_of(&input.name) {
        Some(index) if index == input.index => Ok(None),
        Some(index) => Err(RSIAMError::IndexMismatch {
            name: input.name.clone(),
            declared: format!("{} by exogenous data", index),
            requested: format!("{} by {}", input.index, component),
        }),
        None => Err(RSIAMError::MissingInput {
            variable: input.name.clone(),
            component: component.to_string(),
        }),
    }
}

/// Check that a component declared everything it promised.
pub(crate) fn verify_outputs_declared(
    namespace: &ModelNamespace,
    component: &dyn Component,
    name: &str,
) -> RSIAMResult<()> {
    for output in component.outputs() {
        match namespace.index_of(&output.name) {
            Some(index) if index == output.index => {}
            Some(index) => {
                return Err(RSIAMError::IndexMismatch {
                    name: output.name.clone(),
                    declared: index.to_string(),
                    requested: output.index.to_string(),
                })
            }
            None => {
                return Err(RSIAMError::UndeclaredOutput {
                    component: name.to_string(),
                    variable: output.name.clone(),
                })
            }
        }
    }
    Ok(())
}

/// Order the components so that every producer comes before its consumers.
///
/// The component graph must be a directed acyclic graph. A cycle means that
/// component `A` reads a variable declared by `B` while `B` reads one declared
/// by `A`, so neither can be built first.
pub(crate) fn dependency_order(graph: &CGraph) -> RSIAMResult<Vec<NodeIndex>> {
    toposort(graph, None)
        .map_err(|cycle| RSIAMError::CircularDependency(component_name(&*graph[cycle.node_id()])))
}
