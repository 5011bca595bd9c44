//! Damage and adaptation parameters

use log::warn;
use rsiam_core::coefficients::{CoefficientProvider, DamageModule};
use rsiam_core::errors::{RSIAMError, RSIAMResult};
use rsiam_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Damage and adaptation coefficients of one region
///
/// Gross damages as a fraction of GDP follow
///
/// $$ D(T) = a_1 T + a_2 T^{a_3} $$
///
/// and adapting at level $P$ costs $g_1 P^{g_2}$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageCoefficients {
    pub a1: FloatValue,
    pub a2: FloatValue,
    pub a3: FloatValue,
    pub g1: FloatValue,
    pub g2: FloatValue,
}

impl DamageCoefficients {
    /// Look up the coefficients of a model region for `module`.
    pub fn from_provider(
        provider: &dyn CoefficientProvider,
        region: &str,
        module: DamageModule,
    ) -> RSIAMResult<Self> {
        Ok(Self {
            a1: provider.coefficient(region, module, "a1")?,
            a2: provider.coefficient(region, module, "a2")?,
            a3: provider.coefficient(region, module, "a3")?,
            g1: provider.coefficient(region, module, "g1")?,
            g2: provider.coefficient(region, module, "g2")?,
        })
    }

    /// Whether optimal adaptation is defined for these coefficients
    pub fn can_adapt(&self) -> bool {
        self.g1 * self.g2 > 0.0
    }
}

/// Parameters for damages and adaptation
///
/// When `perc_reversible_damages` is 1, damages are a function of the current
/// temperature only. Below 1, damages accumulate from the damage rate and only
/// that share of the accumulated damage is recovered when temperatures fall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageParameters {
    /// Multiplier applied to all gross damages.
    ///
    /// Default: 1.0
    pub scale_factor: FloatValue,

    /// Share of damages that is reversed when temperatures fall.
    ///
    /// Must lie in [0, 1].
    /// Default: 1.0 (fully reversible)
    pub perc_reversible_damages: FloatValue,

    /// Use `adapt_curr_level` as the adaptation level instead of the optimal one.
    ///
    /// Default: false
    pub fixed_adaptation: bool,

    /// Adaptation level used when `fixed_adaptation` is set.
    ///
    /// Default: 0.0
    pub adapt_curr_level: FloatValue,

    /// Coefficients of each model region.
    ///
    /// Default: empty, usually filled from a [`CoefficientProvider`]
    pub coefficients: BTreeMap<String, DamageCoefficients>,
}

impl Default for DamageParameters {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            perc_reversible_damages: 1.0,
            fixed_adaptation: false,
            adapt_curr_level: 0.0,
            coefficients: BTreeMap::new(),
        }
    }
}

impl DamageParameters {
    /// Fill the regional coefficients from `provider`.
    ///
    /// Regions that already have coefficients are overwritten.
    pub fn with_coefficients_from(
        mut self,
        provider: &dyn CoefficientProvider,
        module: DamageModule,
        regions: &[String],
    ) -> RSIAMResult<Self> {
        for region in regions {
            let coefficients = DamageCoefficients::from_provider(provider, region, module)?;
            self.coefficients.insert(region.clone(), coefficients);
        }
        Ok(self)
    }

    pub fn validate(&self) -> RSIAMResult<()> {
        if !(0.0..=1.0).contains(&self.perc_reversible_damages) {
            return Err(RSIAMError::InvalidParameter {
                parameter: "perc_reversible_damages".to_string(),
                value: self.perc_reversible_damages,
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.adapt_curr_level) {
            return Err(RSIAMError::InvalidParameter {
                parameter: "adapt_curr_level".to_string(),
                value: self.adapt_curr_level,
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        Ok(())
    }

    /// Coefficients of each region, in region order.
    pub fn coefficients_for(&self, regions: &[String]) -> RSIAMResult<Vec<DamageCoefficients>> {
        regions
            .iter()
            .map(|region| {
                let coefficients = self.coefficients.get(region).copied().ok_or_else(|| {
                    RSIAMError::MissingParameter {
                        parameter: "damage coefficients".to_string(),
                        context: format!("region {region}"),
                    }
                })?;
                if !self.fixed_adaptation && !coefficients.can_adapt() {
                    warn!(
                        "Adaptation is disabled in {} since g1 * g2 = {} is not positive",
                        region,
                        coefficients.g1 * coefficients.g2
                    );
                }
                Ok(coefficients)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsiam_core::coefficients::RegionalCoefficients;

    #[test]
    fn coefficients_come_from_the_provider() {
        let mut table = RegionalCoefficients::new();
        for (column, value) in [("a1", 0.0), ("a2", 0.003), ("a3", 2.0), ("g1", 0.1), ("g2", 2.5)] {
            table.insert(DamageModule::Witch, "LACA", column, value);
        }
        let params = DamageParameters::default()
            .with_coefficients_from(&table, DamageModule::Witch, &["R5.2LAM".to_string()])
            .unwrap();
        let c = params.coefficients["R5.2LAM"];
        assert_eq!(c.a2, 0.003);
        assert_eq!(c.g2, 2.5);
        assert!(c.can_adapt());
    }

    #[test]
    fn reversibility_must_be_a_share() {
        let params = DamageParameters {
            perc_reversible_damages: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RSIAMError::InvalidParameter { parameter, .. }) if parameter == "perc_reversible_damages"
        ));
    }

    #[test]
    fn missing_region_is_reported() {
        let err = DamageParameters::default()
            .coefficients_for(&["World".to_string()])
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
