//! The shared model namespace.
//!
//! Every component receives the same [`ModelNamespace`] while the model is
//! assembled. A component declares the variables and parameters it owns and
//! reads names that were declared before it, either by another component or
//! as exogenous data. A name can only be declared once.
//!
//! Variables hold one value per point of their index. Decision variables are
//! varied by the external solver; exogenous variables are fixed data supplied
//! by the caller (for example the temperature pathway or population).

use crate::errors::{RSIAMError, RSIAMResult};
use crate::registry::RegisteredConstraint;
use crate::timeseries::{FloatValue, Time, TimeAxis};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Index set of a variable or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Index {
    /// A single value
    Scalar,
    /// One value per time step
    Time,
    /// One value per region
    Region,
    /// One value per time step and region
    TimeRegion,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Index::Scalar => "()",
            Index::Time => "(t)",
            Index::Region => "(r)",
            Index::TimeRegion => "(t, r)",
        };
        write!(f, "{name}")
    }
}

/// Whether a variable is varied by the solver or fixed input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableRole {
    Decision,
    Exogenous,
}

/// Warm-start value of a decision variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initial {
    /// Left as NaN until the solver provides a value
    Unset,
    Constant(FloatValue),
    /// One value per region, repeated over time
    PerRegion(Vec<FloatValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    pub unit: String,
    pub index: Index,
    pub bounds: Option<(FloatValue, FloatValue)>,
    pub initial: Initial,
}

impl VariableDefinition {
    pub fn new(name: &str, unit: &str, index: Index) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            index,
            bounds: None,
            initial: Initial::Unset,
        }
    }

    pub fn time(name: &str, unit: &str) -> Self {
        Self::new(name, unit, Index::Time)
    }

    pub fn time_region(name: &str, unit: &str) -> Self {
        Self::new(name, unit, Index::TimeRegion)
    }

    pub fn with_bounds(mut self, lower: FloatValue, upper: FloatValue) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    pub fn with_initial(mut self, initial: Initial) -> Self {
        self.initial = initial;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub definition: VariableDefinition,
    pub role: VariableRole,
    /// Values laid out as `[time, region]`; a dimension the variable is not
    /// indexed over has length 1.
    pub values: Array2<FloatValue>,
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    Scalar(FloatValue),
    Regional(Array1<FloatValue>),
}

impl Parameter {
    pub fn flag(value: bool) -> Self {
        Parameter::Scalar(if value { 1.0 } else { 0.0 })
    }

    pub fn index(&self) -> Index {
        match self {
            Parameter::Scalar(_) => Index::Scalar,
            Parameter::Regional(_) => Index::Region,
        }
    }
}

/// Explicit model context shared by all components during assembly.
#[derive(Debug, Clone)]
pub struct ModelNamespace {
    time_axis: TimeAxis,
    regions: Vec<String>,
    variables: BTreeMap<String, Variable>,
    parameters: BTreeMap<String, Parameter>,
    constraints: Vec<RegisteredConstraint>,
}

impl ModelNamespace {
    pub fn new(time_axis: TimeAxis, regions: Vec<String>) -> RSIAMResult<Self> {
        if regions.is_empty() {
            return Err(RSIAMError::InvalidRegions(
                "at least one region is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = regions.iter().find(|r| !seen.insert(r.as_str())) {
            return Err(RSIAMError::InvalidRegions(format!(
                "region '{duplicate}' is listed more than once"
            )));
        }

        Ok(Self {
            time_axis,
            regions,
            variables: BTreeMap::new(),
            parameters: BTreeMap::new(),
            constraints: Vec::new(),
        })
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn n_steps(&self) -> usize {
        self.time_axis.len()
    }

    pub fn year(&self, t: usize) -> Time {
        self.time_axis.year(t)
    }

    pub fn dt(&self, t: usize) -> Time {
        self.time_axis.dt(t)
    }

    pub fn begin_year(&self) -> Time {
        self.time_axis.begin_year()
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn n_regions(&self) -> usize {
        self.regions.len()
    }

    /// Is `name` declared as either a variable or a parameter
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.parameters.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<Index> {
        self.variables
            .get(name)
            .map(|v| v.definition.index)
            .or_else(|| self.parameters.get(name).map(Parameter::index))
    }

    fn shape_for(&self, index: Index) -> (usize, usize) {
        match index {
            Index::Scalar => (1, 1),
            Index::Time => (self.n_steps(), 1),
            Index::Region => (1, self.n_regions()),
            Index::TimeRegion => (self.n_steps(), self.n_regions()),
        }
    }

    fn ensure_undeclared(&self, name: &str) -> RSIAMResult<()> {
        if self.contains(name) {
            return Err(RSIAMError::DuplicateDeclaration(name.to_string()));
        }
        Ok(())
    }

    /// Declare a decision variable, filled with its initial values.
    pub fn declare_variable(&mut self, definition: VariableDefinition) -> RSIAMResult<()> {
        self.ensure_undeclared(&definition.name)?;
        let (nt, nr) = self.shape_for(definition.index);

        let values = match &definition.initial {
            Initial::Unset => Array2::from_elem((nt, nr), FloatValue::NAN),
            Initial::Constant(value) => Array2::from_elem((nt, nr), *value),
            Initial::PerRegion(per_region) => {
                if per_region.len() != nr {
                    return Err(RSIAMError::ShapeMismatch {
                        name: definition.name.clone(),
                        expected: vec![nr],
                        actual: vec![per_region.len()],
                    });
                }
                Array2::from_shape_fn((nt, nr), |(_, r)| per_region[r])
            }
        };

        self.variables.insert(
            definition.name.clone(),
            Variable {
                definition,
                role: VariableRole::Decision,
                values,
            },
        );
        Ok(())
    }

    /// Declare fixed data supplied from outside the model.
    pub fn declare_exogenous(
        &mut self,
        definition: VariableDefinition,
        values: Array2<FloatValue>,
    ) -> RSIAMResult<()> {
        self.ensure_undeclared(&definition.name)?;
        let (nt, nr) = self.shape_for(definition.index);
        if values.dim() != (nt, nr) {
            return Err(RSIAMError::ShapeMismatch {
                name: definition.name.clone(),
                expected: vec![nt, nr],
                actual: values.shape().to_vec(),
            });
        }

        self.variables.insert(
            definition.name.clone(),
            Variable {
                definition,
                role: VariableRole::Exogenous,
                values,
            },
        );
        Ok(())
    }

    pub fn declare_parameter(&mut self, name: &str, parameter: Parameter) -> RSIAMResult<()> {
        self.ensure_undeclared(name)?;
        if let Parameter::Regional(values) = &parameter {
            if values.len() != self.n_regions() {
                return Err(RSIAMError::ShapeMismatch {
                    name: name.to_string(),
                    expected: vec![self.n_regions()],
                    actual: vec![values.len()],
                });
            }
        }
        self.parameters.insert(name.to_string(), parameter);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Variables the external solver is expected to vary.
    pub fn decision_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .values()
            .filter(|v| v.role == VariableRole::Decision)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    fn lookup(&self, name: &str, requested: Index) -> RSIAMResult<&Variable> {
        let variable = self.variables.get(name).ok_or_else(|| {
            if self.parameters.contains_key(name) {
                RSIAMError::IndexMismatch {
                    name: name.to_string(),
                    declared: "a parameter".to_string(),
                    requested: format!("a variable {requested}"),
                }
            } else {
                RSIAMError::UndeclaredName(name.to_string())
            }
        })?;
        if variable.definition.index != requested {
            return Err(RSIAMError::IndexMismatch {
                name: name.to_string(),
                declared: variable.definition.index.to_string(),
                requested: requested.to_string(),
            });
        }
        Ok(variable)
    }

    /// Value of a `(t, r)` variable
    pub fn value(&self, name: &str, t: usize, r: usize) -> RSIAMResult<FloatValue> {
        let variable = self.lookup(name, Index::TimeRegion)?;
        Ok(variable.values[(t, r)])
    }

    /// Value of a `(t)` variable
    pub fn value_at(&self, name: &str, t: usize) -> RSIAMResult<FloatValue> {
        let variable = self.lookup(name, Index::Time)?;
        Ok(variable.values[(t, 0)])
    }

    pub fn values(&self, name: &str) -> RSIAMResult<&Array2<FloatValue>> {
        self.variables
            .get(name)
            .map(|v| &v.values)
            .ok_or_else(|| RSIAMError::UndeclaredName(name.to_string()))
    }

    pub fn scalar(&self, name: &str) -> RSIAMResult<FloatValue> {
        match self.parameters.get(name) {
            Some(Parameter::Scalar(value)) => Ok(*value),
            Some(Parameter::Regional(_)) => Err(RSIAMError::IndexMismatch {
                name: name.to_string(),
                declared: Index::Region.to_string(),
                requested: Index::Scalar.to_string(),
            }),
            None => Err(RSIAMError::UndeclaredName(name.to_string())),
        }
    }

    pub fn regional(&self, name: &str, r: usize) -> RSIAMResult<FloatValue> {
        match self.parameters.get(name) {
            Some(Parameter::Regional(values)) => Ok(values[r]),
            Some(Parameter::Scalar(_)) => Err(RSIAMError::IndexMismatch {
                name: name.to_string(),
                declared: Index::Scalar.to_string(),
                requested: Index::Region.to_string(),
            }),
            None => Err(RSIAMError::UndeclaredName(name.to_string())),
        }
    }

    /// A scalar parameter interpreted as a boolean flag (non-zero is set)
    pub fn flag(&self, name: &str) -> RSIAMResult<bool> {
        Ok(self.scalar(name)? != 0.0)
    }

    /// Overwrite a single value of a decision variable.
    pub fn set_value(
        &mut self,
        name: &str,
        t: usize,
        r: usize,
        value: FloatValue,
    ) -> RSIAMResult<()> {
        let variable = self.decision_mut(name)?;
        let (t, r) = match variable.definition.index {
            Index::Scalar => (0, 0),
            Index::Time => (t, 0),
            Index::Region => (0, r),
            Index::TimeRegion => (t, r),
        };
        variable.values[(t, r)] = value;
        Ok(())
    }

    /// Replace all values of a decision variable.
    pub fn set_values(&mut self, name: &str, values: Array2<FloatValue>) -> RSIAMResult<()> {
        let variable = self.decision_mut(name)?;
        if variable.values.dim() != values.dim() {
            return Err(RSIAMError::ShapeMismatch {
                name: name.to_string(),
                expected: variable.values.shape().to_vec(),
                actual: values.shape().to_vec(),
            });
        }
        variable.values = values;
        Ok(())
    }

    fn decision_mut(&mut self, name: &str) -> RSIAMResult<&mut Variable> {
        let variable = self
            .variables
            .get_mut(name)
            .ok_or_else(|| RSIAMError::UndeclaredName(name.to_string()))?;
        if variable.role == VariableRole::Exogenous {
            return Err(RSIAMError::Error(format!(
                "'{name}' is exogenous data and cannot be modified"
            )));
        }
        Ok(variable)
    }

    pub fn constraints(&self) -> &[RegisteredConstraint] {
        &self.constraints
    }

    pub(crate) fn push_constraint(&mut self, constraint: RegisteredConstraint) {
        self.constraints.push(constraint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn namespace() -> ModelNamespace {
        ModelNamespace::new(
            TimeAxis::uniform(2020.0, 2030.0, 5.0).unwrap(),
            vec!["A".to_string(), "B".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn names_are_declared_once() {
        let mut ns = namespace();
        ns.declare_variable(VariableDefinition::time_region("x", "1"))
            .unwrap();
        let result = ns.declare_parameter("x", Parameter::Scalar(1.0));
        assert!(matches!(result, Err(RSIAMError::DuplicateDeclaration(n)) if n == "x"));
    }

    #[test]
    fn initial_values_fill_the_grid() {
        let mut ns = namespace();
        ns.declare_variable(
            VariableDefinition::time_region("k", "1")
                .with_initial(Initial::PerRegion(vec![1.0, 2.0])),
        )
        .unwrap();
        assert_eq!(ns.value("k", 2, 0).unwrap(), 1.0);
        assert_eq!(ns.value("k", 2, 1).unwrap(), 2.0);

        ns.declare_variable(VariableDefinition::time("npv", "1")).unwrap();
        assert!(ns.value_at("npv", 0).unwrap().is_nan());
    }

    #[test]
    fn index_mismatch_is_reported() {
        let mut ns = namespace();
        ns.declare_variable(VariableDefinition::time("npv", "1")).unwrap();
        assert!(matches!(
            ns.value("npv", 0, 0),
            Err(RSIAMError::IndexMismatch { .. })
        ));
        assert!(matches!(
            ns.scalar("missing"),
            Err(RSIAMError::UndeclaredName(_))
        ));
    }

    #[test]
    fn exogenous_values_are_read_only() {
        let mut ns = namespace();
        ns.declare_exogenous(
            VariableDefinition::time("temperature", "K"),
            array![[1.0], [1.1], [1.2]],
        )
        .unwrap();
        assert_eq!(ns.value_at("temperature", 2).unwrap(), 1.2);
        assert!(ns.set_value("temperature", 0, 0, 3.0).is_err());
    }

    #[test]
    fn regional_parameters_need_one_value_per_region() {
        let mut ns = namespace();
        let result = ns.declare_parameter("a1", Parameter::Regional(array![1.0]));
        assert!(matches!(result, Err(RSIAMError::ShapeMismatch { .. })));
    }

    #[test]
    fn duplicate_regions_are_rejected() {
        let result = ModelNamespace::new(
            TimeAxis::uniform(2020.0, 2030.0, 5.0).unwrap(),
            vec!["A".to_string(), "A".to_string()],
        );
        assert!(matches!(result, Err(RSIAMError::InvalidRegions(_))));
    }
}
