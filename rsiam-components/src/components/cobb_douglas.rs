//! Cobb-Douglas Growth Component
//!
//! Net output, investment, consumption and utility of each region, with
//! capital accumulated from investment.
//!
//! # Inputs
//!
//! - `TFP` (t, r) - Total factor productivity
//! - `L` (t, r) - Population (labour)
//! - `baseline_GDP` (t, r) - GDP of the baseline scenario, in the currency unit
//! - `abatement_costs` (t, r) - Abatement costs, in the currency unit
//! - `damage_costs` (t, r) - Damage and adaptation costs as a fraction of GDP,
//!   only read unless damages are ignored
//!
//! # Outputs
//!
//! - `capital_stock`, `GDP_gross`, `GDP_net`, `investments`, `consumption`,
//!   `utility` (t, r)
//! - `consumption_NPV`, `baseline_consumption_NPV`, `consumption_loss` (t)
//!
//! # Capital recursion
//!
//! The rate of change of capital is evaluated at the *current* capital stock:
//!
//! $$ K_t = K_{t-1} + \Delta t \left( \ln(1 - \delta) K_t + I_t \right) $$

use crate::parameters::GrowthParameters;
use ndarray::Array1;
use rsiam_core::component::{Component, RequirementDefinition};
use rsiam_core::economics::{capital_step, checked_div, discount_factor, gdp, utility};
use rsiam_core::errors::RSIAMResult;
use rsiam_core::namespace::{Initial, ModelNamespace, Parameter, VariableDefinition};
use rsiam_core::relation::{Evaluation, Relation, RelationSet};
use rsiam_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Warm start of the baseline consumption NPV, kept away from zero
const BASELINE_NPV_INITIAL: FloatValue = 0.01;

/// Cobb-Douglas growth with a fixed savings rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CobbDouglas {
    parameters: GrowthParameters,
    currency_unit: String,
}

impl CobbDouglas {
    pub fn from_parameters(parameters: GrowthParameters) -> Self {
        Self::new(parameters, "trillion US$2005")
    }

    pub fn new(parameters: GrowthParameters, currency_unit: &str) -> Self {
        Self {
            parameters,
            currency_unit: currency_unit.to_string(),
        }
    }

    pub fn parameters(&self) -> &GrowthParameters {
        &self.parameters
    }
}

#[typetag::serde]
impl Component for CobbDouglas {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        let currency = self.currency_unit.as_str();
        let mut definitions = vec![
            RequirementDefinition::time_region_input("TFP", "1"),
            RequirementDefinition::time_region_input("L", "billion people"),
            RequirementDefinition::time_region_input("baseline_GDP", currency),
            RequirementDefinition::time_region_input("abatement_costs", currency),
        ];
        if !self.parameters.ignore_damages {
            definitions.push(RequirementDefinition::time_region_input(
                "damage_costs",
                "1",
            ));
        }
        definitions.extend([
            RequirementDefinition::time_region_output("capital_stock", currency),
            RequirementDefinition::time_region_output("GDP_gross", currency),
            RequirementDefinition::time_region_output("GDP_net", currency),
            RequirementDefinition::time_region_output("investments", currency),
            RequirementDefinition::time_region_output("consumption", currency),
            RequirementDefinition::time_region_output("utility", "1"),
            RequirementDefinition::time_output("consumption_NPV", currency),
            RequirementDefinition::time_output("baseline_consumption_NPV", currency),
            RequirementDefinition::time_output("consumption_loss", "1"),
        ]);
        definitions
    }

    fn constraints(&self, namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet> {
        let params = &self.parameters;
        params.validate()?;
        let currency = self.currency_unit.as_str();

        let initial_capital = params.initial_capital_for(namespace.regions())?;
        let initial_gdp = namespace.value("baseline_GDP", 0, 0)?;

        namespace.declare_parameter("alpha", Parameter::Scalar(params.alpha))?;
        namespace.declare_parameter("dk", Parameter::Scalar(params.dk))?;
        namespace.declare_parameter("sr", Parameter::Scalar(params.sr))?;
        namespace.declare_parameter("elasmu", Parameter::Scalar(params.elasmu))?;
        namespace.declare_parameter("ignore_damages", Parameter::flag(params.ignore_damages))?;
        namespace.declare_parameter(
            "init_capitalstock",
            Parameter::Regional(Array1::from(initial_capital.clone())),
        )?;

        namespace.declare_variable(
            VariableDefinition::time_region("capital_stock", currency)
                .with_initial(Initial::PerRegion(initial_capital)),
        )?;
        namespace.declare_variable(
            VariableDefinition::time_region("GDP_gross", currency)
                .with_initial(Initial::Constant(initial_gdp)),
        )?;
        namespace.declare_variable(VariableDefinition::time_region("GDP_net", currency))?;
        namespace.declare_variable(VariableDefinition::time_region("investments", currency))?;
        namespace.declare_variable(
            VariableDefinition::time_region("consumption", currency)
                .with_initial(Initial::Constant((1.0 - params.sr) * initial_gdp)),
        )?;
        namespace.declare_variable(VariableDefinition::time_region("utility", "1"))?;

        namespace.declare_variable(VariableDefinition::time("consumption_NPV", currency))?;
        namespace.declare_variable(
            VariableDefinition::time("baseline_consumption_NPV", currency)
                .with_initial(Initial::Constant(BASELINE_NPV_INITIAL)),
        )?;
        namespace.declare_variable(VariableDefinition::time("consumption_loss", "1"))?;

        let mut relations = RelationSet::new();
        relations.extend(growth_relations());
        relations.extend(npv_relations());
        Ok(relations)
    }
}

fn growth_relations() -> Vec<Relation> {
    vec![
        Relation::regional("GDP_gross", |ns, t, r| {
            let output = gdp(
                ns.value("TFP", t, r)?,
                ns.value("L", t, r)?,
                ns.value("capital_stock", t, r)?,
                ns.scalar("alpha")?,
            )?;
            Ok(Evaluation::equals(ns.value("GDP_gross", t, r)?, output))
        }),
        Relation::regional("GDP_net", |ns, t, r| {
            let damages = if ns.flag("ignore_damages")? {
                0.0
            } else {
                ns.value("damage_costs", t, r)?
            };
            let net = ns.value("GDP_gross", t, r)? * (1.0 - damages)
                - ns.value("abatement_costs", t, r)?;
            Ok(Evaluation::equals(ns.value("GDP_net", t, r)?, net))
        }),
        Relation::regional("investments", |ns, t, r| {
            Ok(Evaluation::equals(
                ns.value("investments", t, r)?,
                ns.scalar("sr")? * ns.value("GDP_net", t, r)?,
            ))
        }),
        Relation::regional("consumption", |ns, t, r| {
            Ok(Evaluation::equals(
                ns.value("consumption", t, r)?,
                (1.0 - ns.scalar("sr")?) * ns.value("GDP_net", t, r)?,
            ))
        }),
        Relation::regional("utility", |ns, t, r| {
            let u = utility(
                ns.value("consumption", t, r)?,
                ns.value("L", t, r)?,
                ns.scalar("elasmu")?,
            )?;
            Ok(Evaluation::equals(ns.value("utility", t, r)?, u))
        }),
        Relation::regional("capital_stock", |ns, t, r| {
            if t == 0 {
                return Ok(Evaluation::Skip);
            }
            let capital = ns.value("capital_stock", t, r)?;
            let dt = ns.dt(t);
            let rate = capital_step(capital, ns.scalar("dk")?, ns.value("investments", t, r)?, dt)?;
            Ok(Evaluation::equals(
                capital,
                ns.value("capital_stock", t - 1, r)? + dt * rate,
            ))
        }),
        Relation::regional_init("init_capitalstock", |ns, r| {
            Ok(Evaluation::equals(
                ns.value("capital_stock", 0, r)?,
                ns.regional("init_capitalstock", r)?,
            ))
        }),
    ]
}

/// Discounted sum over regions of `term(t, r)` at step `t`
fn discounted_total(
    ns: &ModelNamespace,
    t: usize,
    term: impl Fn(usize) -> RSIAMResult<FloatValue>,
) -> RSIAMResult<FloatValue> {
    let mut total = 0.0;
    for r in 0..ns.n_regions() {
        total += term(r)?;
    }
    Ok(discount_factor(ns.year(t), ns.begin_year()) * total)
}

fn npv_relations() -> Vec<Relation> {
    vec![
        Relation::global("consumption_NPV", |ns, t| {
            if t == 0 {
                return Ok(Evaluation::Skip);
            }
            let increment = discounted_total(ns, t, |r| ns.value("consumption", t, r))?;
            Ok(Evaluation::equals(
                ns.value_at("consumption_NPV", t)? - ns.value_at("consumption_NPV", t - 1)?,
                ns.dt(t) * increment,
            ))
        }),
        Relation::global_init("consumption_NPV[0]", |ns| {
            Ok(Evaluation::equals(ns.value_at("consumption_NPV", 0)?, 0.0))
        }),
        Relation::global("baseline_consumption_NPV", |ns, t| {
            if t == 0 {
                return Ok(Evaluation::Skip);
            }
            let sr = ns.scalar("sr")?;
            let increment =
                discounted_total(ns, t, |r| Ok((1.0 - sr) * ns.value("baseline_GDP", t, r)?))?;
            Ok(Evaluation::equals(
                ns.value_at("baseline_consumption_NPV", t)?
                    - ns.value_at("baseline_consumption_NPV", t - 1)?,
                ns.dt(t) * increment,
            ))
        }),
        Relation::global_init("baseline_consumption_NPV[0]", |ns| {
            Ok(Evaluation::equals(
                ns.value_at("baseline_consumption_NPV", 0)?,
                0.0,
            ))
        }),
        Relation::global("consumption_loss", |ns, t| {
            if t == 0 {
                return Ok(Evaluation::Skip);
            }
            let ratio = checked_div(
                ns.value_at("consumption_NPV", t)?,
                ns.value_at("baseline_consumption_NPV", t)?,
                "consumption loss",
            )?;
            Ok(Evaluation::equals(
                ns.value_at("consumption_loss", t)?,
                1.0 - ratio,
            ))
        }),
        Relation::global_init("consumption_loss[0]", |ns| {
            Ok(Evaluation::equals(ns.value_at("consumption_loss", 0)?, 0.0))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn component(ignore_damages: bool) -> CobbDouglas {
        CobbDouglas::from_parameters(GrowthParameters {
            ignore_damages,
            initial_capital: BTreeMap::from([("World".to_string(), 100.0)]),
            ..Default::default()
        })
    }

    #[test]
    fn damage_costs_are_only_read_when_used() {
        assert!(component(false)
            .input_names()
            .contains(&"damage_costs".to_string()));
        assert!(!component(true)
            .input_names()
            .contains(&"damage_costs".to_string()));
    }

    #[test]
    fn outputs() {
        let outputs = component(false).output_names();
        assert_eq!(outputs.len(), 9);
        assert!(outputs.contains(&"capital_stock".to_string()));
        assert!(outputs.contains(&"consumption_loss".to_string()));
    }

    #[test]
    fn serialises_with_type_tag() {
        let component: Box<dyn Component> = Box::new(component(true));
        let json = serde_json::to_string(&component).unwrap();
        assert!(json.starts_with(r#"{"type":"CobbDouglas""#));
        let restored: Box<dyn Component> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.output_names(), component.output_names());
    }
}
