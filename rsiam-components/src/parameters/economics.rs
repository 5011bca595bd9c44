//! Economic growth parameters

use rsiam_core::errors::{NumericalError, RSIAMError, RSIAMResult};
use rsiam_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for Cobb-Douglas growth with a fixed savings rate
///
/// Gross output follows
///
/// $$ Y = TFP \cdot L^{1-\alpha} \cdot K^{\alpha} $$
///
/// and a share `sr` of net output is invested into the capital stock, which
/// depreciates at rate `dk` per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParameters {
    /// Output elasticity of capital.
    ///
    /// Must lie strictly between 0 and 1.
    /// Default: 0.3
    pub alpha: FloatValue,

    /// Annual depreciation rate of capital.
    ///
    /// Must lie in [0, 1).
    /// Default: 0.1
    pub dk: FloatValue,

    /// Savings rate, the share of net output that is invested.
    ///
    /// Default: 0.21
    pub sr: FloatValue,

    /// Elasticity of marginal utility of consumption.
    ///
    /// A value of exactly 1 (log utility) is not supported by the utility form.
    /// Default: 1.45
    pub elasmu: FloatValue,

    /// Exclude damage costs from net output.
    ///
    /// When set, the growth component neither reads `damage_costs` nor needs a
    /// damage component in the model.
    /// Default: false
    pub ignore_damages: bool,

    /// Capital stock of each region at the first time step, in the model
    /// currency unit.
    ///
    /// Default: empty, so every region must be given explicitly
    pub initial_capital: BTreeMap<String, FloatValue>,
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            dk: 0.1,
            sr: 0.21,
            elasmu: 1.45,
            ignore_damages: false,
            initial_capital: BTreeMap::new(),
        }
    }
}

impl GrowthParameters {
    /// Check the parameters that are fixed for the whole run.
    pub fn validate(&self) -> RSIAMResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(RSIAMError::InvalidParameter {
                parameter: "alpha".to_string(),
                value: self.alpha,
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.dk) {
            return Err(NumericalError::InvalidDepreciation(self.dk).into());
        }
        if self.elasmu == 1.0 {
            return Err(RSIAMError::InvalidParameter {
                parameter: "elasmu".to_string(),
                value: self.elasmu,
                reason: "log utility is not supported".to_string(),
            });
        }
        Ok(())
    }

    /// Initial capital of each region, in region order.
    pub fn initial_capital_for(&self, regions: &[String]) -> RSIAMResult<Vec<FloatValue>> {
        regions
            .iter()
            .map(|region| {
                self.initial_capital.get(region).copied().ok_or_else(|| {
                    RSIAMError::MissingParameter {
                        parameter: "init_capitalstock".to_string(),
                        context: format!("region {region}"),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_use_defaults() {
        let params: GrowthParameters = toml::from_str(
            r#"
            sr = 0.2
            [initial_capital]
            World = 100.0
            "#,
        )
        .unwrap();
        assert_eq!(params.sr, 0.2);
        assert_eq!(params.alpha, 0.3);
        assert!(!params.ignore_damages);
        assert_eq!(params.initial_capital["World"], 100.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let params = GrowthParameters {
            alpha: 1.0,
            ..Default::default()
        };
        assert!(params.validate().unwrap_err().is_configuration());

        let params = GrowthParameters {
            dk: 1.0,
            ..Default::default()
        };
        assert!(params.validate().unwrap_err().is_numerical());
    }

    #[test]
    fn initial_capital_follows_region_order() {
        let params = GrowthParameters {
            initial_capital: BTreeMap::from([("B".to_string(), 2.0), ("A".to_string(), 1.0)]),
            ..Default::default()
        };
        let regions = vec!["B".to_string(), "A".to_string()];
        assert_eq!(params.initial_capital_for(&regions).unwrap(), vec![2.0, 1.0]);

        let err = params
            .initial_capital_for(&["C".to_string()])
            .unwrap_err();
        assert!(matches!(err, RSIAMError::MissingParameter { .. }));
    }
}
