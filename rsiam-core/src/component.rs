//! Components contribute variables, parameters and relations to a model.
//!
//! A component lists the variables it reads and the variables it owns through
//! [`Component::definitions`]. The [`ModelBuilder`](crate::model::ModelBuilder)
//! uses these definitions to order components so that every producer declares
//! its outputs before any consumer reads them, then calls
//! [`Component::constraints`] on each component in turn.

use crate::errors::RSIAMResult;
use crate::namespace::{Index, ModelNamespace};
use crate::relation::RelationSet;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum RequirementType {
    /// Read by the component; declared by another component or supplied as exogenous data
    Input,
    /// Declared by the component
    Output,
}

/// A named variable that a component reads or declares.
#[derive(Debug, Eq, PartialEq, Clone, Hash, Serialize, Deserialize)]
pub struct RequirementDefinition {
    pub name: String,
    pub unit: String,
    pub requirement_type: RequirementType,
    pub index: Index,
}

impl RequirementDefinition {
    pub fn new(name: &str, unit: &str, requirement_type: RequirementType, index: Index) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            requirement_type,
            index,
        }
    }

    pub fn scalar_input(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Input, Index::Scalar)
    }

    pub fn time_input(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Input, Index::Time)
    }

    pub fn time_region_input(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Input, Index::TimeRegion)
    }

    pub fn time_output(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Output, Index::Time)
    }

    pub fn time_region_output(name: &str, unit: &str) -> Self {
        Self::new(name, unit, RequirementType::Output, Index::TimeRegion)
    }
}

/// Component of an assembled model.
///
/// Components are serialisable so that a model configuration can be stored
/// and rebuilt; the concrete type is recorded under the `type` tag.
#[typetag::serde(tag = "type")]
pub trait Component: Debug + Send + Sync {
    fn definitions(&self) -> Vec<RequirementDefinition>;

    /// Variables that are read by this component
    fn inputs(&self) -> Vec<RequirementDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| d.requirement_type == RequirementType::Input)
            .collect()
    }

    fn input_names(&self) -> Vec<String> {
        self.inputs().into_iter().map(|d| d.name).collect()
    }

    /// Variables that are declared by this component
    fn outputs(&self) -> Vec<RequirementDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| d.requirement_type == RequirementType::Output)
            .collect()
    }

    fn output_names(&self) -> Vec<String> {
        self.outputs().into_iter().map(|d| d.name).collect()
    }

    /// Declare the component's variables and parameters and return its relations.
    ///
    /// Every output must be declared on `namespace` before returning. The
    /// returned relations are registered by the caller in [`RelationSet`] order.
    fn constraints(&self, namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet>;
}
