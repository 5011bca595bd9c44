//! Damage and Adaptation Component
//!
//! Climate damages and adaptation costs of each region, following the
//! RICE/WITCH formulation. The damage module only selects the coefficients;
//! every module shares the same relations.
//!
//! # Inputs
//!
//! - `temperature` (t) - Global mean temperature change
//! - `T0` (scalar) - Reference temperature at which damages are zero
//!
//! # Outputs
//!
//! - `damage_costs` (t, r) - Residual damages plus adaptation costs, as a fraction of GDP
//! - `gross_damages` (t, r) - Damages before adaptation
//! - `resid_damages` (t, r) - Damages left after adaptation
//! - `adapt_costs` (t, r) - Cost of adaptation
//! - `adapt_level` (t, r) - Adaptation level in [0, 1]
//! - `smoothed_factor` (t) - Weight of damage increments in [0, 1]
//!
//! # Irreversible damages
//!
//! With `perc_reversible_damages` $p < 1$, damages accumulate from the damage
//! rate. Increments while warming count fully, while only the share $p$ of a
//! decrease is recovered when cooling:
//!
//! $$ GD_t = GD_{t-1} + \Delta t \cdot s \cdot D'(T_t) \cdot f_t \cdot \frac{T_t - T_{t-1}}{\Delta t} $$
//!
//! with $s$ the damage scale factor and $f_t$ the smoothed factor. Damages then
//! start from zero at the first step. With $p = 1$ damages are a function of
//! the current temperature, relative to `T0`.

use crate::parameters::{DamageCoefficients, DamageParameters};
use ndarray::Array1;
use rsiam_core::coefficients::DamageModule;
use rsiam_core::component::{Component, RequirementDefinition};
use rsiam_core::economics::{
    adaptation_cost, damage_fraction, damage_rate, optimal_adaptation_level, smoothed_factor,
};
use rsiam_core::errors::RSIAMResult;
use rsiam_core::namespace::{ModelNamespace, Parameter, VariableDefinition};
use rsiam_core::relation::{Evaluation, Relation, RelationSet};
use rsiam_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Damages and optimal adaptation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageAdaptation {
    module: DamageModule,
    parameters: DamageParameters,
}

impl DamageAdaptation {
    pub fn from_parameters(module: DamageModule, parameters: DamageParameters) -> Self {
        Self { module, parameters }
    }

    pub fn module(&self) -> DamageModule {
        self.module
    }

    pub fn parameters(&self) -> &DamageParameters {
        &self.parameters
    }
}

/// Whether damages accumulate rather than follow the current temperature
fn irreversible(ns: &ModelNamespace) -> RSIAMResult<bool> {
    Ok(ns.scalar("perc_reversible_damages")? < 1.0)
}

/// Temperature change over the step ending at `t`, per year
fn temperature_rate(ns: &ModelNamespace, t: usize) -> RSIAMResult<FloatValue> {
    Ok((ns.value_at("temperature", t)? - ns.value_at("temperature", t - 1)?) / ns.dt(t))
}

#[typetag::serde]
impl Component for DamageAdaptation {
    fn definitions(&self) -> Vec<RequirementDefinition> {
        vec![
            RequirementDefinition::time_input("temperature", "delta_degC"),
            RequirementDefinition::scalar_input("T0", "delta_degC"),
            RequirementDefinition::time_region_output("damage_costs", "1"),
            RequirementDefinition::time_region_output("gross_damages", "1"),
            RequirementDefinition::time_region_output("resid_damages", "1"),
            RequirementDefinition::time_region_output("adapt_costs", "1"),
            RequirementDefinition::time_region_output("adapt_level", "1"),
            RequirementDefinition::time_output("smoothed_factor", "1"),
        ]
    }

    fn constraints(&self, namespace: &mut ModelNamespace) -> RSIAMResult<RelationSet> {
        let params = &self.parameters;
        params.validate()?;
        let coefficients = params.coefficients_for(namespace.regions())?;

        let regional = |select: fn(&DamageCoefficients) -> FloatValue| {
            Parameter::Regional(coefficients.iter().map(select).collect::<Array1<FloatValue>>())
        };
        namespace.declare_parameter("damage_a1", regional(|c| c.a1))?;
        namespace.declare_parameter("damage_a2", regional(|c| c.a2))?;
        namespace.declare_parameter("damage_a3", regional(|c| c.a3))?;
        namespace.declare_parameter("adapt_g1", regional(|c| c.g1))?;
        namespace.declare_parameter("adapt_g2", regional(|c| c.g2))?;
        namespace.declare_parameter("damage_scale_factor", Parameter::Scalar(params.scale_factor))?;
        namespace.declare_parameter(
            "perc_reversible_damages",
            Parameter::Scalar(params.perc_reversible_damages),
        )?;
        namespace.declare_parameter("adapt_curr_level", Parameter::Scalar(params.adapt_curr_level))?;
        namespace.declare_parameter("fixed_adaptation", Parameter::flag(params.fixed_adaptation))?;

        namespace.declare_variable(VariableDefinition::time_region("damage_costs", "1"))?;
        namespace.declare_variable(
            VariableDefinition::time("smoothed_factor", "1").with_bounds(0.0, 1.0),
        )?;
        namespace.declare_variable(VariableDefinition::time_region("gross_damages", "1"))?;
        namespace.declare_variable(VariableDefinition::time_region("resid_damages", "1"))?;
        namespace.declare_variable(VariableDefinition::time_region("adapt_costs", "1"))?;
        namespace.declare_variable(
            VariableDefinition::time_region("adapt_level", "1").with_bounds(0.0, 1.0),
        )?;

        let mut relations = RelationSet::new();
        relations.extend(damage_relations());
        relations.extend(adaptation_relations());
        Ok(relations)
    }
}

fn damage_relations() -> Vec<Relation> {
    vec![
        Relation::global("smoothed_factor", |ns, t| {
            let factor = if irreversible(ns)? && t > 0 {
                smoothed_factor(temperature_rate(ns, t)?, ns.scalar("perc_reversible_damages")?)
            } else {
                1.0
            };
            Ok(Evaluation::equals(ns.value_at("smoothed_factor", t)?, factor))
        }),
        Relation::regional("gross_damages", |ns, t, r| {
            let scale = ns.scalar("damage_scale_factor")?;
            let (a1, a2, a3) = (
                ns.regional("damage_a1", r)?,
                ns.regional("damage_a2", r)?,
                ns.regional("damage_a3", r)?,
            );
            let temperature = ns.value_at("temperature", t)?;

            if !irreversible(ns)? {
                let damages = damage_fraction(temperature, a1, a2, a3, Some(ns.scalar("T0")?))?;
                return Ok(Evaluation::equals(
                    ns.value("gross_damages", t, r)?,
                    scale * damages,
                ));
            }
            if t == 0 {
                return Ok(Evaluation::Skip);
            }
            let dt = ns.dt(t);
            let increment = scale
                * damage_rate(temperature, a1, a2, a3)?
                * ns.value_at("smoothed_factor", t)?
                * temperature_rate(ns, t)?;
            Ok(Evaluation::equals(
                ns.value("gross_damages", t, r)?,
                ns.value("gross_damages", t - 1, r)? + dt * increment,
            ))
        }),
        Relation::regional_init("gross_damages[0]", |ns, r| {
            if !irreversible(ns)? {
                return Ok(Evaluation::Skip);
            }
            Ok(Evaluation::equals(ns.value("gross_damages", 0, r)?, 0.0))
        }),
    ]
}

fn adaptation_relations() -> Vec<Relation> {
    vec![
        Relation::regional("adapt_level", |ns, t, r| {
            let (g1, g2) = (ns.regional("adapt_g1", r)?, ns.regional("adapt_g2", r)?);
            let level = if ns.flag("fixed_adaptation")? {
                ns.scalar("adapt_curr_level")?
            } else if g1 * g2 > 0.0 {
                optimal_adaptation_level(ns.value("gross_damages", t, r)?, g1, g2)?
            } else {
                0.0
            };
            Ok(Evaluation::equals(ns.value("adapt_level", t, r)?, level))
        }),
        Relation::regional("resid_damages", |ns, t, r| {
            Ok(Evaluation::equals(
                ns.value("resid_damages", t, r)?,
                ns.value("gross_damages", t, r)? * (1.0 - ns.value("adapt_level", t, r)?),
            ))
        }),
        Relation::regional("adapt_costs", |ns, t, r| {
            let costs = adaptation_cost(
                ns.value("adapt_level", t, r)?,
                ns.regional("adapt_g1", r)?,
                ns.regional("adapt_g2", r)?,
            )?;
            Ok(Evaluation::equals(ns.value("adapt_costs", t, r)?, costs))
        }),
        Relation::regional("damage_costs", |ns, t, r| {
            Ok(Evaluation::equals(
                ns.value("damage_costs", t, r)?,
                ns.value("resid_damages", t, r)? + ns.value("adapt_costs", t, r)?,
            ))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions() {
        let component =
            DamageAdaptation::from_parameters(DamageModule::Witch, DamageParameters::default());
        assert_eq!(component.input_names(), vec!["temperature", "T0"]);
        assert_eq!(component.outputs().len(), 6);
    }

    #[test]
    fn serialises_with_type_tag() {
        let component: Box<dyn Component> = Box::new(DamageAdaptation::from_parameters(
            DamageModule::Rice2012,
            DamageParameters::default(),
        ));
        let json = serde_json::to_string(&component).unwrap();
        assert!(json.starts_with(r#"{"type":"DamageAdaptation","module":"RICE2012""#));
    }
}
