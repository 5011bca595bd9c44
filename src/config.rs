//! Model configuration read from TOML.
//!
//! ```toml
//! [model]
//! damage_module = "WITCH"
//! regions = ["R5.2OECD", "R5.2ASIA"]
//! begin_year = 2020
//! end_year = 2100
//! timestep = 5
//!
//! [economics]
//! sr = 0.2
//!
//! [economics.initial_capital]
//! "R5.2OECD" = "120 trillion US$2005"
//! "R5.2ASIA" = [40, "trillion USD2005"]
//!
//! [damages]
//! perc_reversible_damages = 0.5
//!
//! [adaptation]
//! fixed_adaptation = false
//!
//! [default_units]
//! currency_unit = "billion US$2005"
//! ```
//!
//! Every table is optional and missing values take their defaults.

use rsiam_components::parameters::{DamageParameters, GrowthParameters};
use rsiam_core::coefficients::DamageModule;
use rsiam_core::errors::{RSIAMError, RSIAMResult};
use rsiam_core::timeseries::{FloatValue, Time, TimeAxis};
use rsiam_core::units::{QuantityResolver, QuantitySpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Units that quantities are converted to unless a configuration overrides them
pub fn default_units() -> BTreeMap<String, String> {
    [
        ("currency_unit", "trillion US$2005"),
        ("emissions_unit", "GtCO2"),
        ("emissionsrate_unit", "GtCO2/yr"),
        ("population_unit", "billion people"),
        ("temperature_unit", "delta_degC"),
    ]
    .into_iter()
    .map(|(name, unit)| (name.to_string(), unit.to_string()))
    .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: ModelSettings,
    pub economics: EconomicsConfig,
    pub damages: DamagesConfig,
    pub adaptation: AdaptationConfig,
    /// Overrides of [`default_units`]
    pub default_units: BTreeMap<String, String>,
}

/// Time grid, regions and damage module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// One of `RICE2010`, `RICE2012` or `WITCH`.
    ///
    /// Kept as text so that an unknown module is reported when the model is
    /// assembled.
    /// Default: "RICE2010"
    pub damage_module: String,

    /// Default: the five SSP R5.2 regions
    pub regions: Vec<String>,

    /// Default: 2020
    pub begin_year: Time,

    /// Last year of the grid, included when it lies on a step.
    ///
    /// Default: 2100
    pub end_year: Time,

    /// Default: 5
    pub timestep: Time,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            damage_module: "RICE2010".to_string(),
            regions: ["R5.2OECD", "R5.2REF", "R5.2ASIA", "R5.2MAF", "R5.2LAM"]
                .into_iter()
                .map(String::from)
                .collect(),
            begin_year: 2020.0,
            end_year: 2100.0,
            timestep: 5.0,
        }
    }
}

/// Growth parameters, with initial capital written as quantities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsConfig {
    pub alpha: FloatValue,
    pub dk: FloatValue,
    pub sr: FloatValue,
    pub elasmu: FloatValue,
    pub ignore_damages: bool,
    /// Capital stock of each region at the first step, in any currency unit
    pub initial_capital: BTreeMap<String, QuantitySpec>,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        let defaults = GrowthParameters::default();
        Self {
            alpha: defaults.alpha,
            dk: defaults.dk,
            sr: defaults.sr,
            elasmu: defaults.elasmu,
            ignore_damages: defaults.ignore_damages,
            initial_capital: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamagesConfig {
    pub scale_factor: FloatValue,
    pub perc_reversible_damages: FloatValue,
}

impl Default for DamagesConfig {
    fn default() -> Self {
        let defaults = DamageParameters::default();
        Self {
            scale_factor: defaults.scale_factor,
            perc_reversible_damages: defaults.perc_reversible_damages,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationConfig {
    pub fixed_adaptation: bool,
    pub curr_level: FloatValue,
}

impl ModelConfig {
    pub fn from_toml_str(contents: &str) -> RSIAMResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn damage_module(&self) -> RSIAMResult<DamageModule> {
        self.model.damage_module.parse()
    }

    pub fn time_axis(&self) -> RSIAMResult<TimeAxis> {
        TimeAxis::uniform(
            self.model.begin_year,
            self.model.end_year,
            self.model.timestep,
        )
    }

    /// Resolver with the built-in default units, overridden by the configured ones
    pub fn resolver(&self) -> QuantityResolver {
        let mut units = default_units();
        units.extend(self.default_units.clone());
        QuantityResolver::new(units)
    }

    /// Definition of a default unit, such as `currency_unit`
    pub fn unit(&self, name: &str) -> RSIAMResult<String> {
        self.default_units
            .get(name)
            .cloned()
            .or_else(|| default_units().remove(name))
            .ok_or_else(|| RSIAMError::MissingParameter {
                parameter: name.to_string(),
                context: "default units".to_string(),
            })
    }

    /// Growth parameters with initial capital converted to the currency unit
    pub fn growth_parameters(&self, resolver: &QuantityResolver) -> RSIAMResult<GrowthParameters> {
        let economics = &self.economics;
        let mut initial_capital = BTreeMap::new();
        for (region, quantity) in &economics.initial_capital {
            initial_capital.insert(region.clone(), resolver.magnitude(quantity, "currency_unit")?);
        }
        Ok(GrowthParameters {
            alpha: economics.alpha,
            dk: economics.dk,
            sr: economics.sr,
            elasmu: economics.elasmu,
            ignore_damages: economics.ignore_damages,
            initial_capital,
        })
    }

    /// Damage parameters without regional coefficients
    pub fn damage_parameters(&self) -> DamageParameters {
        DamageParameters {
            scale_factor: self.damages.scale_factor,
            perc_reversible_damages: self.damages.perc_reversible_damages,
            fixed_adaptation: self.adaptation.fixed_adaptation,
            adapt_curr_level: self.adaptation.curr_level,
            coefficients: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ModelConfig::from_toml_str("").unwrap();
        assert_eq!(config.model.regions.len(), 5);
        assert_eq!(config.damage_module().unwrap(), DamageModule::Rice2010);
        assert_eq!(config.time_axis().unwrap().len(), 17);
        assert_eq!(config.economics.alpha, 0.3);
        assert_eq!(config.unit("currency_unit").unwrap(), "trillion US$2005");
    }

    #[test]
    fn initial_capital_is_converted_to_the_currency_unit() {
        let config = ModelConfig::from_toml_str(
            r#"
            [economics.initial_capital]
            "R5.2OECD" = "120 trillion US$2005"
            "R5.2ASIA" = [40000, "billion USD2005"]

            [default_units]
            currency_unit = "billion US$2005"
            "#,
        )
        .unwrap();
        let params = config.growth_parameters(&config.resolver()).unwrap();
        assert_relative_eq!(params.initial_capital["R5.2OECD"], 120_000.0);
        assert_relative_eq!(params.initial_capital["R5.2ASIA"], 40_000.0);
        // Other default units are kept
        assert_eq!(config.unit("emissions_unit").unwrap(), "GtCO2");
    }

    #[test]
    fn skipped_initial_capital_is_rejected() {
        let config = ModelConfig::from_toml_str(
            r#"
            [economics.initial_capital]
            "R5.2OECD" = false
            "#,
        )
        .unwrap();
        let err = config.growth_parameters(&config.resolver()).unwrap_err();
        assert!(matches!(err, RSIAMError::Quantity(_)));
    }

    #[test]
    fn unknown_module_is_reported_when_parsed() {
        let config = ModelConfig::from_toml_str("[model]\ndamage_module = \"UNKNOWN\"\n").unwrap();
        assert!(config.damage_module().unwrap_err().is_configuration());
    }

    #[test]
    fn non_finite_end_year_is_rejected() {
        let config = ModelConfig::from_toml_str("[model]\nend_year = nan\n").unwrap();
        let err = config.time_axis().unwrap_err();
        assert!(matches!(err, RSIAMError::InvalidTimeAxis(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ModelConfig::from_toml_str("[model\n"),
            Err(RSIAMError::Toml(_))
        ));
    }
}
