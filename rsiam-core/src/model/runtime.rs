//! Model struct and residual evaluation.

use crate::errors::{NumericalError, RSIAMResult};
use crate::namespace::ModelNamespace;
use crate::relation::{Evaluation, Point};
use crate::timeseries::FloatValue;
use ndarray::Array2;
use petgraph::dot::{Config, Dot};
use serde::{Deserialize, Serialize};

use super::types::CGraph;

/// Residual of one registered constraint at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResidual {
    /// Generated constraint name
    pub name: String,
    pub label: String,
    pub point: Point,
    pub value: FloatValue,
}

/// A decision-variable value outside its declared bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundViolation {
    pub variable: String,
    pub t: usize,
    pub region: usize,
    pub value: FloatValue,
    pub lower: FloatValue,
    pub upper: FloatValue,
}

/// An assembled model.
///
/// The structure of the model is fixed once it is built: the components,
/// declared names and registered constraints do not change. The external
/// solver varies the values of decision variables through
/// [`Model::namespace_mut`] and evaluates the constraints with
/// [`Model::residuals`].
#[derive(Debug)]
pub struct Model {
    /// Components as nodes, with edges from the component that declares a
    /// variable to each component that reads it.
    components: CGraph,
    build_order: Vec<String>,
    namespace: ModelNamespace,
}

impl Model {
    pub fn new(components: CGraph, build_order: Vec<String>, namespace: ModelNamespace) -> Self {
        Self {
            components,
            build_order,
            namespace,
        }
    }

    pub fn namespace(&self) -> &ModelNamespace {
        &self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut ModelNamespace {
        &mut self.namespace
    }

    /// Component type names in the order they were built.
    pub fn build_order(&self) -> &[String] {
        &self.build_order
    }

    pub fn constraint_names(&self) -> Vec<&str> {
        self.namespace
            .constraints()
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Replace all values of a decision variable.
    pub fn set_values(&mut self, name: &str, values: Array2<FloatValue>) -> RSIAMResult<()> {
        self.namespace.set_values(name, values)
    }

    pub fn values(&self, name: &str) -> RSIAMResult<&Array2<FloatValue>> {
        self.namespace.values(name)
    }

    /// Evaluate every registered constraint at every point it applies to.
    ///
    /// Points where a relation does not apply are left out. A residual that is
    /// not finite is reported as a [`NumericalError`] naming the constraint.
    pub fn residuals(&self) -> RSIAMResult<Vec<ConstraintResidual>> {
        let mut residuals = Vec::new();
        for constraint in self.namespace.constraints() {
            for point in constraint.relation.points(&self.namespace) {
                let value = match constraint.relation.evaluate(&self.namespace, point)? {
                    Evaluation::Residual(value) => value,
                    Evaluation::Skip => continue,
                };
                if !value.is_finite() {
                    return Err(NumericalError::NonFinite {
                        what: format!(
                            "{} ({}) at t={}{}",
                            constraint.name,
                            constraint.relation.label(),
                            point.t,
                            point.region.map(|r| format!(", r={r}")).unwrap_or_default()
                        ),
                        value,
                    }
                    .into());
                }
                residuals.push(ConstraintResidual {
                    name: constraint.name.clone(),
                    label: constraint.relation.label().to_string(),
                    point,
                    value,
                });
            }
        }
        Ok(residuals)
    }

    pub fn max_abs_residual(&self) -> RSIAMResult<FloatValue> {
        Ok(self
            .residuals()?
            .iter()
            .fold(0.0, |acc: FloatValue, r| acc.max(r.value.abs())))
    }

    /// Residuals whose magnitude exceeds `tolerance`.
    pub fn violations(&self, tolerance: FloatValue) -> RSIAMResult<Vec<ConstraintResidual>> {
        Ok(self
            .residuals()?
            .into_iter()
            .filter(|r| r.value.abs() > tolerance)
            .collect())
    }

    /// Decision-variable values that lie outside their declared bounds.
    ///
    /// Values that have not been set yet (NaN) are not reported.
    pub fn bound_violations(&self) -> Vec<BoundViolation> {
        let mut violations = Vec::new();
        for variable in self.namespace.decision_variables() {
            let Some((lower, upper)) = variable.definition.bounds else {
                continue;
            };
            for ((t, region), &value) in variable.values.indexed_iter() {
                if value < lower || value > upper {
                    violations.push(BoundViolation {
                        variable: variable.definition.name.clone(),
                        t,
                        region,
                        value,
                        lower,
                        upper,
                    });
                }
            }
        }
        violations
    }

    /// Create a diagram that represents the component graph.
    ///
    /// Useful for debugging.
    pub fn as_dot(&self) -> Dot<'_, &CGraph> {
        Dot::with_attr_getters(
            &self.components,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, er| format!("label = {:?}", er.weight().name),
            &|_, (_, component)| {
                let debug_str = format!("{:?}", component);
                let escaped = debug_str.replace('\\', "\\\\").replace('"', "\\\"");
                format!("label = \"{}\"", escaped)
            },
        )
    }
}
