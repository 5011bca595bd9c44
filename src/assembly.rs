//! Assembly of the growth and damage model from a configuration.

use crate::config::ModelConfig;
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rsiam_components::components::{CobbDouglas, DamageAdaptation};
use rsiam_core::coefficients::CoefficientProvider;
use rsiam_core::economics::{tfp_series, HistoricalEconomy};
use rsiam_core::errors::{RSIAMError, RSIAMResult};
use rsiam_core::model::{Model, ModelBuilder};
use rsiam_core::namespace::{Parameter, VariableDefinition};
use rsiam_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Data supplied from outside the model.
///
/// Regional series are shaped `[time, region]`, following the configured time
/// grid and region order, and are given in the configured default units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExogenousData {
    /// Global mean temperature change, one value per time step
    pub temperature: Array1<FloatValue>,
    /// Reference temperature at which damages are zero
    pub t0: FloatValue,
    pub tfp: Array2<FloatValue>,
    pub population: Array2<FloatValue>,
    pub baseline_gdp: Array2<FloatValue>,
    pub abatement_costs: Array2<FloatValue>,
}

impl ExogenousData {
    /// Replace `tfp` with the productivity implied by each region's history.
    ///
    /// Capital is rolled forward from the configured initial capital with the
    /// configured growth parameters. Every history must contain the years of
    /// the time grid.
    pub fn calibrate_tfp(
        &mut self,
        config: &ModelConfig,
        histories: &BTreeMap<String, HistoricalEconomy>,
    ) -> RSIAMResult<()> {
        let time_axis = config.time_axis()?;
        let regions = &config.model.regions;
        let growth = config.growth_parameters(&config.resolver())?;
        let initial_capital = growth.initial_capital_for(regions)?;

        let mut tfp = Array2::zeros((time_axis.len(), regions.len()));
        for (r, region) in regions.iter().enumerate() {
            let history = histories
                .get(region)
                .ok_or_else(|| RSIAMError::MissingParameter {
                    parameter: "historical economy".to_string(),
                    context: format!("TFP calibration of {region}"),
                })?;
            let implied = tfp_series(
                history,
                initial_capital[r],
                growth.alpha,
                growth.dk,
                growth.sr,
            )?;
            for (t, &year) in time_axis.values().iter().enumerate() {
                let i = history
                    .years
                    .iter()
                    .position(|&y| y == year)
                    .ok_or_else(|| {
                        RSIAMError::InvalidTimeAxis(format!(
                            "history of {region} has no value for {year}"
                        ))
                    })?;
                tfp[[t, r]] = implied[i];
            }
        }
        debug!("Calibrated TFP for {} regions", regions.len());
        self.tfp = tfp;
        Ok(())
    }
}

/// Build the constraint system described by `config`.
///
/// The damage module is resolved before anything is declared, so an unknown
/// module name fails without registering any relation. Coefficients of every
/// configured region are looked up in `coefficients`.
pub fn assemble(
    config: &ModelConfig,
    coefficients: &dyn CoefficientProvider,
    data: &ExogenousData,
) -> RSIAMResult<Model> {
    let module = config.damage_module()?;
    let time_axis = config.time_axis()?;
    let regions = &config.model.regions;

    let resolver = config.resolver();
    let currency = config.unit("currency_unit")?;
    let population = config.unit("population_unit")?;
    let temperature = config.unit("temperature_unit")?;

    let growth = config.growth_parameters(&resolver)?;
    let damages = config
        .damage_parameters()
        .with_coefficients_from(coefficients, module, regions)?;

    info!(
        "Assembling {} steps from {} for {} regions with {} damages",
        time_axis.len(),
        time_axis.begin_year(),
        regions.len(),
        module
    );

    let mut builder = ModelBuilder::new();
    builder
        .with_time_axis(time_axis)
        .with_regions(regions.iter().cloned())
        .with_exogenous_variable(
            VariableDefinition::time("temperature", &temperature),
            data.temperature.clone().insert_axis(Axis(1)),
        )
        .with_exogenous_parameter("T0", Parameter::Scalar(data.t0))
        .with_exogenous_variable(VariableDefinition::time_region("TFP", "1"), data.tfp.clone())
        .with_exogenous_variable(
            VariableDefinition::time_region("L", &population),
            data.population.clone(),
        )
        .with_exogenous_variable(
            VariableDefinition::time_region("baseline_GDP", &currency),
            data.baseline_gdp.clone(),
        )
        .with_exogenous_variable(
            VariableDefinition::time_region("abatement_costs", &currency),
            data.abatement_costs.clone(),
        )
        .with_component(Arc::new(CobbDouglas::new(growth, &currency)))
        .with_component(Arc::new(DamageAdaptation::from_parameters(module, damages)));

    builder.build()
}
