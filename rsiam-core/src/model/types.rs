use crate::component::{Component, RequirementDefinition};
use petgraph::Graph;
use std::sync::Arc;

/// A component shared between the builder and the built model.
pub type C = Arc<dyn Component>;

/// Component dependency graph; edges point from producer to consumer.
pub type CGraph = Graph<C, RequirementDefinition>;
