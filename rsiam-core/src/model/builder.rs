//! Model builder for assembling models from components.

use crate::component::Component;
use crate::errors::{RSIAMError, RSIAMResult};
use crate::namespace::{ModelNamespace, Parameter, VariableDefinition};
use crate::registry::register_all;
use crate::timeseries::{FloatValue, TimeAxis};
use log::info;
use ndarray::Array2;
use petgraph::Graph;
use std::collections::HashMap;
use std::sync::Arc;

use super::runtime::Model;
use super::types::{CGraph, C};
use super::validation::{
    component_name, dependency_order, verify_input, verify_outputs_declared, Producer,
};

/// Build a new model from a set of components.
///
/// The builder generates a graph that defines the inter-component dependencies
/// and determines which variables are declared by components and which must be
/// supplied as exogenous data. Components are then built in dependency order
/// against a single namespace.
pub struct ModelBuilder {
    components: Vec<C>,
    exogenous_variables: Vec<(VariableDefinition, Array2<FloatValue>)>,
    exogenous_parameters: Vec<(String, Parameter)>,
    time_axis: Option<TimeAxis>,
    regions: Vec<String>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            components: vec![],
            exogenous_variables: vec![],
            exogenous_parameters: vec![],
            time_axis: None,
            regions: vec![],
        }
    }

    /// Specify the time grid the relations are stated on.
    pub fn with_time_axis(&mut self, time_axis: TimeAxis) -> &mut Self {
        self.time_axis = Some(time_axis);
        self
    }

    /// Specify the ordered set of regions.
    pub fn with_regions<S: Into<String>>(
        &mut self,
        regions: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Register a component with the builder.
    pub fn with_component(&mut self, component: Arc<dyn Component>) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Supply fixed data for a variable that no component declares.
    ///
    /// `values` is laid out as `[time, region]`, with length 1 along any
    /// dimension the variable is not indexed over.
    pub fn with_exogenous_variable(
        &mut self,
        definition: VariableDefinition,
        values: Array2<FloatValue>,
    ) -> &mut Self {
        self.exogenous_variables.push((definition, values));
        self
    }

    /// Supply a parameter that no component declares.
    pub fn with_exogenous_parameter(&mut self, name: &str, parameter: Parameter) -> &mut Self {
        self.exogenous_parameters
            .push((name.to_string(), parameter));
        self
    }

    /// Builds the component graph and registers the relations of every component.
    ///
    /// Returns an error if a required input is neither declared by a component
    /// nor supplied exogenously, if a variable has more than one producer, if
    /// the dependencies contain a cycle, or if any component fails to build.
    pub fn build(&self) -> RSIAMResult<Model> {
        let time_axis = self
            .time_axis
            .clone()
            .ok_or_else(|| RSIAMError::InvalidTimeAxis("no time axis was set".to_string()))?;
        let mut namespace = ModelNamespace::new(time_axis, self.regions.clone())?;

        for (definition, values) in &self.exogenous_variables {
            namespace.declare_exogenous(definition.clone(), values.clone())?;
        }
        for (name, parameter) in &self.exogenous_parameters {
            namespace.declare_parameter(name, parameter.clone())?;
        }

        let mut graph: CGraph = Graph::new();
        let mut producers: HashMap<String, Producer> = HashMap::new();
        let nodes: Vec<_> = self
            .components
            .iter()
            .map(|component| graph.add_node(component.clone()))
            .collect();

        for (component, &node) in self.components.iter().zip(&nodes) {
            let name = component_name(component.as_ref());
            for output in component.outputs() {
                if namespace.contains(&output.name) {
                    return Err(RSIAMError::DuplicateProducer {
                        variable: output.name.clone(),
                        first: "exogenous data".to_string(),
                        second: name,
                    });
                }
                if let Some(existing) = producers.get(&output.name) {
                    return Err(RSIAMError::DuplicateProducer {
                        variable: output.name.clone(),
                        first: existing.component.clone(),
                        second: name,
                    });
                }
                producers.insert(
                    output.name.clone(),
                    Producer {
                        node,
                        component: name.clone(),
                        definition: output,
                    },
                );
            }
        }

        for (component, &node) in self.components.iter().zip(&nodes) {
            let name = component_name(component.as_ref());
            for input in component.inputs() {
                if let Some(producer) = verify_input(&namespace, &producers, &input, &name)? {
                    if producer != node {
                        graph.add_edge(producer, node, input);
                    }
                }
            }
        }

        let order = dependency_order(&graph)?;
        let mut build_order = Vec::with_capacity(order.len());
        for node in order {
            let component = graph[node].clone();
            let name = component_name(component.as_ref());

            let relations = component.constraints(&mut namespace)?;
            verify_outputs_declared(&namespace, component.as_ref(), &name)?;
            let registered = register_all(&mut namespace, relations);
            info!("Built {} ({} constraints)", name, registered.len());

            build_order.push(name);
        }

        info!(
            "Assembled model with {} components, {} constraints over {} steps and {} regions",
            build_order.len(),
            namespace.constraints().len(),
            namespace.n_steps(),
            namespace.n_regions()
        );

        Ok(Model::new(graph, build_order, namespace))
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
