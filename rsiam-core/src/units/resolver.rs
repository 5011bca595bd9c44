//! Conversion of configured quantities into model units.
//!
//! Configuration values are written with their units, either as a single
//! expression (`"20 GtCO2/yr"`) or as a value and a unit (`[20, "GtCO2/yr"]`).
//! The target unit may name one of the model's default units, such as
//! `currency_unit` or `emissionsrate_unit`.

use super::parser::Quantity;
use crate::errors::{QuantityError, RSIAMError, RSIAMResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A quantity as written in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "toml::Value", into = "toml::Value")]
pub enum QuantitySpec {
    /// A number and its unit in one expression
    Text(String),
    /// A number and a separate unit expression
    Value(f64, String),
    /// The quantity was switched off with `false`
    Skip,
}

impl QuantitySpec {
    /// Build a quantity from its arguments, excluding the target unit.
    ///
    /// One argument is an expression (or `false`), two are a value and a unit.
    pub fn from_args(args: &[toml::Value]) -> RSIAMResult<Self> {
        if !(1..=2).contains(&args.len()) {
            // Counted with the target unit
            return Err(QuantityError::WrongArgumentCount(args.len() + 1).into());
        }
        match args {
            [toml::Value::Boolean(false), ..] => Ok(QuantitySpec::Skip),
            [toml::Value::String(text)] => Ok(QuantitySpec::Text(text.clone())),
            [value, toml::Value::String(unit)] => {
                let value = match value {
                    toml::Value::Float(v) => *v,
                    toml::Value::Integer(v) => *v as f64,
                    other => return Err(parse_error(other, "expected a number")),
                };
                Ok(QuantitySpec::Value(value, unit.clone()))
            }
            [other] => Err(parse_error(other, "expected a quantity expression")),
            [_, other, ..] => Err(parse_error(other, "expected a unit expression")),
            [] => Err(QuantityError::WrongArgumentCount(1).into()),
        }
    }
}

fn parse_error(value: &toml::Value, details: &str) -> RSIAMError {
    QuantityError::Parse {
        input: value.to_string(),
        details: details.to_string(),
    }
    .into()
}

impl TryFrom<toml::Value> for QuantitySpec {
    type Error = RSIAMError;

    fn try_from(value: toml::Value) -> Result<Self, Self::Error> {
        match value {
            toml::Value::Array(args) => QuantitySpec::from_args(&args),
            toml::Value::Float(v) => Ok(QuantitySpec::Value(v, "1".to_string())),
            toml::Value::Integer(v) => Ok(QuantitySpec::Value(v as f64, "1".to_string())),
            other => QuantitySpec::from_args(&[other]),
        }
    }
}

impl From<QuantitySpec> for toml::Value {
    fn from(spec: QuantitySpec) -> Self {
        match spec {
            QuantitySpec::Text(text) => toml::Value::String(text),
            QuantitySpec::Value(value, unit) => {
                toml::Value::Array(vec![toml::Value::Float(value), toml::Value::String(unit)])
            }
            QuantitySpec::Skip => toml::Value::Boolean(false),
        }
    }
}

/// Resolves quantities into magnitudes in a target unit.
///
/// Names of default units are replaced by their parenthesised definitions in
/// both the source and the target expression, and `US$` is read as `USD`.
#[derive(Debug, Clone, Default)]
pub struct QuantityResolver {
    default_units: BTreeMap<String, String>,
}

impl QuantityResolver {
    pub fn new(default_units: BTreeMap<String, String>) -> Self {
        Self { default_units }
    }

    pub fn default_units(&self) -> &BTreeMap<String, String> {
        &self.default_units
    }

    /// Rewrite an expression so it only contains registered units.
    pub fn expand(&self, expression: &str) -> String {
        let mut expanded = expression.replace("US$", "USD");

        // Longest names first so no name is replaced inside a longer one
        let mut names: Vec<(&String, &String)> = self.default_units.iter().collect();
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        for (name, unit) in names {
            let unit = format!("({})", unit.replace("US$", "USD"));
            expanded = expanded.replace(name.as_str(), &unit);
        }
        expanded
    }

    /// Magnitude of `spec` expressed in `target`.
    ///
    /// A skipped quantity resolves to `None` when `allow_skip` is set and is an
    /// error otherwise.
    pub fn resolve(
        &self,
        spec: &QuantitySpec,
        target: &str,
        allow_skip: bool,
    ) -> RSIAMResult<Option<f64>> {
        let source = match spec {
            QuantitySpec::Skip if allow_skip => return Ok(None),
            QuantitySpec::Skip => return Err(QuantityError::SkipNotAllowed.into()),
            QuantitySpec::Text(text) => Quantity::parse(&self.expand(text))?,
            QuantitySpec::Value(value, unit) => {
                let unit = Quantity::parse(&self.expand(unit))?;
                Quantity {
                    magnitude: value * unit.magnitude,
                    ..unit
                }
            }
        };
        let target_quantity = Quantity::parse(&self.expand(target))?;

        if source.dimension != target_quantity.dimension {
            let from = match spec {
                QuantitySpec::Text(text) => text.clone(),
                QuantitySpec::Value(_, unit) => unit.clone(),
                QuantitySpec::Skip => String::new(),
            };
            return Err(QuantityError::IncompatibleUnits {
                from,
                to: target.to_string(),
            }
            .into());
        }
        Ok(Some(source.magnitude / target_quantity.magnitude))
    }

    /// Resolve a quantity that must be present.
    pub fn magnitude(&self, spec: &QuantitySpec, target: &str) -> RSIAMResult<f64> {
        self.resolve(spec, target, false)?
            .ok_or_else(|| QuantityError::SkipNotAllowed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn resolver() -> QuantityResolver {
        QuantityResolver::new(BTreeMap::from([
            ("currency_unit".to_string(), "trillion US$2005".to_string()),
            ("emissions_unit".to_string(), "GtCO2".to_string()),
            ("emissionsrate_unit".to_string(), "GtCO2/yr".to_string()),
            ("population_unit".to_string(), "billion people".to_string()),
        ]))
    }

    #[test]
    fn text_quantities_convert_to_default_units() {
        let value = resolver()
            .magnitude(&QuantitySpec::Text("20 GtC/yr".to_string()), "emissionsrate_unit")
            .unwrap();
        assert_relative_eq!(value, 20.0 * 44.0 / 12.0, max_relative = 1e-12);
    }

    #[test]
    fn value_and_unit_quantities() {
        let spec = QuantitySpec::Value(250.0, "billion US$2005".to_string());
        let value = resolver().magnitude(&spec, "currency_unit").unwrap();
        assert_relative_eq!(value, 0.25, max_relative = 1e-12);
    }

    #[test]
    fn default_units_are_parenthesised() {
        // Unparenthesised, the target would read as `trillion USD2005 / billion * people`
        let value = resolver()
            .magnitude(
                &QuantitySpec::Text("5 USD2005/person".to_string()),
                "currency_unit/population_unit",
            )
            .unwrap();
        assert_relative_eq!(value, 5.0 * 1e9 / 1e12, max_relative = 1e-12);
    }

    #[test]
    fn skip_requires_opt_in() {
        let r = resolver();
        assert_eq!(r.resolve(&QuantitySpec::Skip, "emissions_unit", true).unwrap(), None);
        let err = r
            .resolve(&QuantitySpec::Skip, "emissions_unit", false)
            .unwrap_err();
        assert!(matches!(
            err,
            RSIAMError::Quantity(QuantityError::SkipNotAllowed)
        ));
    }

    #[test]
    fn incompatible_units_are_rejected() {
        let err = resolver()
            .magnitude(&QuantitySpec::Text("3 GtCO2".to_string()), "currency_unit")
            .unwrap_err();
        assert!(matches!(
            err,
            RSIAMError::Quantity(QuantityError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn argument_count_is_checked() {
        let err = QuantitySpec::from_args(&[
            toml::Value::Float(1.0),
            toml::Value::String("USD".to_string()),
            toml::Value::String("USD".to_string()),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RSIAMError::Quantity(QuantityError::WrongArgumentCount(4))
        ));
        assert!(matches!(
            QuantitySpec::from_args(&[]),
            Err(RSIAMError::Quantity(QuantityError::WrongArgumentCount(1)))
        ));
    }

    #[test]
    fn specs_deserialise_from_toml() {
        #[derive(Deserialize)]
        struct Table {
            a: QuantitySpec,
            b: QuantitySpec,
            c: QuantitySpec,
        }
        let table: Table = toml::from_str(
            r#"
            a = "100 trillion USD2005"
            b = [3, "GtC"]
            c = false
            "#,
        )
        .unwrap();
        assert_eq!(table.a, QuantitySpec::Text("100 trillion USD2005".to_string()));
        assert_eq!(table.b, QuantitySpec::Value(3.0, "GtC".to_string()));
        assert_eq!(table.c, QuantitySpec::Skip);
    }
}
