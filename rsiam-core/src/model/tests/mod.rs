//! Model builder and runtime tests using small test components.

use crate::component::{Component, RequirementDefinition};
use crate::errors::{NumericalError, RSIAMError, RSIAMResult};
use crate::model::{Model, ModelBuilder};
use crate::namespace::{Initial, ModelNamespace, Parameter, VariableDefinition};
use crate::relation::{Evaluation, Relation, RelationSet};
use crate::timeseries::TimeAxis;
use approx::assert_abs_diff_eq;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Declares `x`, which must follow the exogenous `forcing` series
#[derive(Debug, Serialize, Deserialize)]
struct Source {
    upper_bound: f64,
}

#[typetag::serde]
impl Component for Source {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::time_input("forcing", "W / m^2"),
            RequirementDefinition::time_output("x", "W / m^2"),
        ]
    }

    fn constraints(&self, namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet> {
        namespace.declare_variable(
            VariableDefinition::time("x", "W / m^2")
                .with_bounds(0.0, self.upper_bound)
                .with_initial(Initial::Constant(1.0)),
        )?;

        let mut relations = RelationSet::new();
        relations.push(Relation::global("x = forcing", |ns, t| {
            Ok(Evaluation::equals(
                ns.value_at("x", t)?,
                ns.value_at("forcing", t)?,
            ))
        }));
        Ok(relations)
    }
}

/// Declares `y = factor * x`
#[derive(Debug, Serialize, Deserialize)]
struct Doubler {
    factor: f64,
}

#[typetag::serde]
impl Component for Doubler {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::time_input("x", "W / m^2"),
            RequirementDefinition::time_output("y", "W / m^2"),
        ]
    }

    fn constraints(&self, namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet> {
        namespace.declare_variable(VariableDefinition::time("y", "W / m^2"))?;
        namespace.declare_parameter("factor", Parameter::Scalar(self.factor))?;

        let mut relations = RelationSet::new();
        relations.push(Relation::global("y = factor * x", |ns, t| {
            Ok(Evaluation::equals(
                ns.value_at("y", t)?,
                ns.scalar("factor")? * ns.value_at("x", t)?,
            ))
        }));
        relations.push(Relation::global_init("y[0] = 2", |ns| {
            Ok(Evaluation::equals(ns.value_at("y", 0)?, 2.0))
        }));
        Ok(relations)
    }
}

/// Reads `y` and declares `x`, closing a loop with [`Doubler`]
#[derive(Debug, Serialize, Deserialize)]
struct Echo {}

#[typetag::serde]
impl Component for Echo {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::time_input("y", "W / m^2"),
            RequirementDefinition::time_output("x", "W / m^2"),
        ]
    }

    fn constraints(&self, namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet> {
        namespace.declare_variable(VariableDefinition::time("x", "W / m^2"))?;
        Ok(RelationSet::new())
    }
}

/// Promises `z` but never declares it
#[derive(Debug, Serialize, Deserialize)]
struct Forgetful {}

#[typetag::serde]
impl Component for Forgetful {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![RequirementDefinition::time_output("z", "1")]
    }

    fn constraints(&self, _namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet> {
        Ok(RelationSet::new())
    }
}

fn builder() -> ModelBuilder {
    let mut builder = ModelBuilder::new();
    builder
        .with_time_axis(TimeAxis::uniform(2020.0, 2030.0, 5.0).unwrap())
        .with_regions(["World"])
        .with_exogenous_variable(
            VariableDefinition::time("forcing", "W / m^2"),
            Array2::from_elem((3, 1), 1.0),
        );
    builder
}

fn build(components: Vec<Arc<dyn Component>>) -> RSIAMResult<Model> {
    let mut builder = builder();
    for component in components {
        builder.with_component(component);
    }
    builder.build()
}

#[test]
fn components_are_built_in_dependency_order() {
    let model = build(vec![
        Arc::new(Doubler { factor: 2.0 }),
        Arc::new(Source { upper_bound: 10.0 }),
    ])
    .unwrap();

    assert_eq!(model.build_order(), &["Source", "Doubler"]);
    assert_eq!(
        model.constraint_names(),
        vec!["constraint_0", "constraint_1", "constraint_2"]
    );
}

#[test]
fn dot() {
    let model = build(vec![
        Arc::new(Doubler { factor: 2.0 }),
        Arc::new(Source { upper_bound: 10.0 }),
    ])
    .unwrap();

    let exp = r#"digraph {
    0 [ label = "Doubler { factor: 2.0 }"]
    1 [ label = "Source { upper_bound: 10.0 }"]
    1 -> 0 [ label = "x"]
}
"#;

    let res = format!("{:?}", model.as_dot());
    assert_eq!(res, exp);
}

#[test]
fn residuals_follow_variable_values() {
    let mut model = build(vec![
        Arc::new(Source { upper_bound: 10.0 }),
        Arc::new(Doubler { factor: 2.0 }),
    ])
    .unwrap();

    // `y` has no initial value yet
    let err = model.residuals().unwrap_err();
    assert!(matches!(
        err,
        RSIAMError::Numerical(NumericalError::NonFinite { .. })
    ));

    model
        .set_values("y", Array2::from_elem((3, 1), 2.0))
        .unwrap();
    let residuals = model.residuals().unwrap();
    // 3 points for each global relation plus the init relation
    assert_eq!(residuals.len(), 7);
    assert_abs_diff_eq!(model.max_abs_residual().unwrap(), 0.0);

    model
        .namespace_mut()
        .set_value("y", 1, 0, 2.5)
        .unwrap();
    let violations = model.violations(1e-9).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].label, "y = factor * x");
    assert_eq!(violations[0].point.t, 1);
    assert_abs_diff_eq!(violations[0].value, 0.5);
}

#[test]
fn exogenous_data_cannot_be_set() {
    let mut model = build(vec![Arc::new(Source { upper_bound: 10.0 })]).unwrap();
    let result = model.set_values("forcing", Array2::zeros((3, 1)));
    assert!(result.is_err());
}

#[test]
fn missing_input_is_reported() {
    let err = build(vec![Arc::new(Doubler { factor: 2.0 })]).unwrap_err();
    match err {
        RSIAMError::MissingInput {
            variable,
            component,
        } => {
            assert_eq!(variable, "x");
            assert_eq!(component, "Doubler");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn duplicate_producers_are_rejected() {
    let err = build(vec![
        Arc::new(Source { upper_bound: 10.0 }),
        Arc::new(Source { upper_bound: 5.0 }),
    ])
    .unwrap_err();
    assert!(matches!(err, RSIAMError::DuplicateProducer { variable, .. } if variable == "x"));
}

#[test]
fn cycles_are_rejected() {
    let err = build(vec![Arc::new(Doubler { factor: 2.0 }), Arc::new(Echo {})]).unwrap_err();
    assert!(matches!(err, RSIAMError::CircularDependency(_)));
}

#[test]
fn undeclared_outputs_are_rejected() {
    let err = build(vec![Arc::new(Forgetful {})]).unwrap_err();
    assert!(matches!(
        err,
        RSIAMError::UndeclaredOutput { variable, .. } if variable == "z"
    ));
}

#[test]
fn bound_violations_are_reported_separately() {
    let model = build(vec![Arc::new(Source { upper_bound: 0.5 })]).unwrap();
    let violations = model.bound_violations();
    assert_eq!(violations.len(), 3);
    assert!(violations.iter().all(|v| v.variable == "x" && v.value == 1.0));
    // The constraint itself is satisfied
    assert_abs_diff_eq!(model.max_abs_residual().unwrap(), 0.0);
}

#[test]
fn components_round_trip_through_serde() {
    let component: Box<dyn Component> = Box::new(Doubler { factor: 3.0 });
    let serialised = serde_json::to_string(&component).unwrap();
    assert_eq!(serialised, r#"{"type":"Doubler","factor":3.0}"#);

    let restored: Box<dyn Component> = serde_json::from_str(&serialised).unwrap();
    assert_eq!(restored.output_names(), vec!["y"]);
}

#[test]
fn missing_time_axis_is_an_error() {
    let err = ModelBuilder::new()
        .with_regions(["World"])
        .build()
        .unwrap_err();
    assert!(matches!(err, RSIAMError::InvalidTimeAxis(_)));
}
