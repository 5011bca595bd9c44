//! Damage and adaptation coefficients per model region.
//!
//! Coefficients are published for the sub-regions of each damage module
//! (RICE2010, RICE2012 or WITCH). A model region is mapped onto a set of
//! sub-regions and its coefficient is the unweighted mean across them.

use crate::errors::{RSIAMError, RSIAMResult};
use crate::timeseries::FloatValue;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Damage and adaptation module whose coefficients are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageModule {
    #[serde(rename = "RICE2010")]
    Rice2010,
    #[serde(rename = "RICE2012")]
    Rice2012,
    #[serde(rename = "WITCH")]
    Witch,
}

impl FromStr for DamageModule {
    type Err = RSIAMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RICE2010" => Ok(DamageModule::Rice2010),
            "RICE2012" => Ok(DamageModule::Rice2012),
            "WITCH" => Ok(DamageModule::Witch),
            other => Err(RSIAMError::UnknownDamageModule(other.to_string())),
        }
    }
}

impl fmt::Display for DamageModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DamageModule::Rice2010 => "RICE2010",
            DamageModule::Rice2012 => "RICE2012",
            DamageModule::Witch => "WITCH",
        };
        write!(f, "{name}")
    }
}

const RICE2010_REGIONS: [(&str, &[&str]); 5] = [
    ("R5.2OECD", &["USA", "JAPAN", "EUROPE"]),
    ("R5.2ASIA", &["CHINA", "INDIA", "LI"]),
    ("R5.2LAM", &["LMI"]),
    ("R5.2MAF", &["AFRICA", "HIO"]),
    ("R5.2REF", &[]),
];

const RICE2012_REGIONS: [(&str, &[&str]); 5] = [
    ("R5.2OECD", &["USA", "JAPAN", "EUROPE"]),
    ("R5.2ASIA", &["CHINA", "INDIA", "LI"]),
    ("R5.2LAM", &["MI"]),
    ("R5.2MAF", &["AFRICA", "OHI"]),
    ("R5.2REF", &["RUSSIA", "EE"]),
];

const WITCH_REGIONS: [(&str, &[&str]); 5] = [
    ("R5.2OECD", &["USA", "Western EU", "CAJAZ"]),
    ("R5.2ASIA", &["CHINA", "INDIA", "SASIA", "EASIA"]),
    ("R5.2LAM", &["LACA"]),
    ("R5.2MAF", &["SSA", "MENA"]),
    ("R5.2REF", &["TE"]),
];

impl DamageModule {
    /// Sub-regions of this module that make up a model region
    pub fn sub_regions(&self, region: &str) -> RSIAMResult<&'static [&'static str]> {
        let mapping: &'static [(&'static str, &'static [&'static str])] = match self {
            DamageModule::Rice2010 => &RICE2010_REGIONS,
            DamageModule::Rice2012 => &RICE2012_REGIONS,
            DamageModule::Witch => &WITCH_REGIONS,
        };
        mapping
            .iter()
            .find(|(name, _)| *name == region)
            .map(|(_, sub_regions)| *sub_regions)
            .ok_or_else(|| RSIAMError::UnknownRegion {
                region: region.to_string(),
                module: self.to_string(),
            })
    }

    /// Name of the coefficient column holding `parameter`.
    ///
    /// RICE2010 coefficients share a table with RICE2012 and are stored with a
    /// `_2010` suffix.
    pub fn column(&self, parameter: &str) -> String {
        match self {
            DamageModule::Rice2010 => format!("{parameter}_2010"),
            DamageModule::Rice2012 | DamageModule::Witch => parameter.to_string(),
        }
    }
}

/// Value used for a region that maps onto no sub-regions.
///
/// The exponents `a3` and `g2` default to 1 so the damage and adaptation cost
/// curves stay defined; every other coefficient defaults to 0.
pub fn empty_mapping_default(parameter: &str) -> FloatValue {
    match parameter {
        "a3" | "g2" => 1.0,
        _ => 0.0,
    }
}

/// Source of damage and adaptation coefficients.
pub trait CoefficientProvider {
    fn coefficient(
        &self,
        region: &str,
        module: DamageModule,
        parameter: &str,
    ) -> RSIAMResult<FloatValue>;
}

/// Coefficients of one module, keyed by sub-region and then by column
pub type CoefficientTable = BTreeMap<String, BTreeMap<String, FloatValue>>;

/// Coefficient tables for each damage module.
///
/// Tables can be read from TOML, with one table per module and one sub-table
/// per sub-region:
///
/// ```toml
/// [WITCH.USA]
/// a1 = 0.0
/// a2 = 0.0023
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegionalCoefficients {
    tables: HashMap<DamageModule, CoefficientTable>,
}

impl RegionalCoefficients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(contents: &str) -> RSIAMResult<Self> {
        let raw: BTreeMap<String, CoefficientTable> = toml::from_str(contents)?;
        let mut coefficients = Self::new();
        for (module, table) in raw {
            coefficients.with_table(module.parse()?, table);
        }
        Ok(coefficients)
    }

    /// Set the table of a module, replacing any existing one.
    pub fn with_table(&mut self, module: DamageModule, table: CoefficientTable) -> &mut Self {
        self.tables.insert(module, table);
        self
    }

    /// Set a single coefficient of a sub-region.
    pub fn insert(
        &mut self,
        module: DamageModule,
        sub_region: &str,
        column: &str,
        value: FloatValue,
    ) -> &mut Self {
        self.tables
            .entry(module)
            .or_default()
            .entry(sub_region.to_string())
            .or_default()
            .insert(column.to_string(), value);
        self
    }
}

impl CoefficientProvider for RegionalCoefficients {
    fn coefficient(
        &self,
        region: &str,
        module: DamageModule,
        parameter: &str,
    ) -> RSIAMResult<FloatValue> {
        let sub_regions = module.sub_regions(region)?;
        if sub_regions.is_empty() {
            let value = empty_mapping_default(parameter);
            warn!(
                "{} maps onto no {} sub-regions, using {} = {}",
                region, module, parameter, value
            );
            return Ok(value);
        }

        let column = module.column(parameter);
        let table = self
            .tables
            .get(&module)
            .ok_or_else(|| RSIAMError::MissingParameter {
                parameter: column.clone(),
                context: format!("{module} coefficients (no table loaded)"),
            })?;

        let mut total = 0.0;
        for sub_region in sub_regions {
            total += table
                .get(*sub_region)
                .and_then(|row| row.get(&column))
                .ok_or_else(|| RSIAMError::MissingParameter {
                    parameter: column.clone(),
                    context: format!("{module} sub-region {sub_region}"),
                })?;
        }
        Ok(total / sub_regions.len() as FloatValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TABLES: &str = r#"
        [RICE2010.AFRICA]
        a1_2010 = 0.34
        a3_2010 = 2.0

        [RICE2010.HIO]
        a1_2010 = 0.06
        a3_2010 = 2.0

        [RICE2012.AFRICA]
        a1 = 0.1

        [RICE2012.OHI]
        a1 = 0.3

        [WITCH.USA]
        g1 = 0.1

        [WITCH."Western EU"]
        g1 = 0.2

        [WITCH.CAJAZ]
        g1 = 0.6
    "#;

    fn coefficients() -> RegionalCoefficients {
        RegionalCoefficients::from_toml_str(TABLES).unwrap()
    }

    #[test]
    fn module_names_parse() {
        assert_eq!("WITCH".parse::<DamageModule>().unwrap(), DamageModule::Witch);
        assert_eq!(DamageModule::Rice2012.to_string(), "RICE2012");
        let err = "UNKNOWN".parse::<DamageModule>().unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, RSIAMError::UnknownDamageModule(name) if name == "UNKNOWN"));
    }

    #[test]
    fn coefficients_are_averaged_over_sub_regions() {
        let c = coefficients();
        assert_relative_eq!(
            c.coefficient("R5.2OECD", DamageModule::Witch, "g1").unwrap(),
            0.3,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            c.coefficient("R5.2MAF", DamageModule::Rice2012, "a1").unwrap(),
            0.2,
            max_relative = 1e-12
        );
    }

    #[test]
    fn rice2010_reads_suffixed_columns() {
        let c = coefficients();
        assert_relative_eq!(
            c.coefficient("R5.2MAF", DamageModule::Rice2010, "a1").unwrap(),
            0.2,
            max_relative = 1e-12
        );
        assert_eq!(
            c.coefficient("R5.2MAF", DamageModule::Rice2010, "a3").unwrap(),
            2.0
        );
    }

    #[test]
    fn empty_mapping_uses_defaults() {
        let c = RegionalCoefficients::new();
        assert_eq!(
            c.coefficient("R5.2REF", DamageModule::Rice2010, "a3").unwrap(),
            1.0
        );
        assert_eq!(
            c.coefficient("R5.2REF", DamageModule::Rice2010, "g2").unwrap(),
            1.0
        );
        assert_eq!(
            c.coefficient("R5.2REF", DamageModule::Rice2010, "a1").unwrap(),
            0.0
        );
    }

    #[test]
    fn unknown_region_is_fatal() {
        let err = coefficients()
            .coefficient("Atlantis", DamageModule::Witch, "g1")
            .unwrap_err();
        assert!(matches!(err, RSIAMError::UnknownRegion { .. }));
    }

    #[test]
    fn missing_coefficient_is_reported() {
        let err = coefficients()
            .coefficient("R5.2OECD", DamageModule::Witch, "a2")
            .unwrap_err();
        assert!(matches!(err, RSIAMError::MissingParameter { parameter, .. } if parameter == "a2"));
    }

    #[test]
    fn unknown_module_in_table_is_rejected() {
        let result = RegionalCoefficients::from_toml_str("[DICE.USA]\na1 = 0.0\n");
        assert!(matches!(result, Err(RSIAMError::UnknownDamageModule(_))));
    }

    #[test]
    fn single_values_can_be_inserted() {
        let mut c = RegionalCoefficients::new();
        c.insert(DamageModule::Witch, "LACA", "a2", 0.004);
        assert_eq!(
            c.coefficient("R5.2LAM", DamageModule::Witch, "a2").unwrap(),
            0.004
        );
    }
}
