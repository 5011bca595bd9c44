//! Known units with their dimensions and conversion factors.
//!
//! Conversion factors convert FROM the registered unit TO the reference unit
//! of its dimension:
//!
//! - currency: `USD`
//! - mass: `kg` of carbon (CO2 masses are scaled by 12/44)
//! - time: `yr`
//! - temperature difference: `K`
//! - population: `people`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Integer exponents of the base dimensions used by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub currency: i8,
    pub mass: i8,
    pub time: i8,
    pub temperature: i8,
    pub population: i8,
}

impl Dimension {
    pub const fn dimensionless() -> Self {
        Self::new(0, 0, 0, 0, 0)
    }

    pub const fn new(currency: i8, mass: i8, time: i8, temperature: i8, population: i8) -> Self {
        Self {
            currency,
            mass,
            time,
            temperature,
            population,
        }
    }

    pub const CURRENCY: Self = Self::new(1, 0, 0, 0, 0);
    pub const MASS: Self = Self::new(0, 1, 0, 0, 0);
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0);
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 1, 0);
    pub const POPULATION: Self = Self::new(0, 0, 0, 0, 1);

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::dimensionless()
    }

    /// Raise every exponent to the power `exp`, or `None` if an exponent leaves the `i8` range
    pub fn checked_powi(&self, exp: i8) -> Option<Self> {
        Some(Self {
            currency: self.currency.checked_mul(exp)?,
            mass: self.mass.checked_mul(exp)?,
            time: self.time.checked_mul(exp)?,
            temperature: self.temperature.checked_mul(exp)?,
            population: self.population.checked_mul(exp)?,
        })
    }

    pub fn checked_mul(&self, rhs: Self) -> Option<Self> {
        Some(Self {
            currency: self.currency.checked_add(rhs.currency)?,
            mass: self.mass.checked_add(rhs.mass)?,
            time: self.time.checked_add(rhs.time)?,
            temperature: self.temperature.checked_add(rhs.temperature)?,
            population: self.population.checked_add(rhs.population)?,
        })
    }

    pub fn checked_div(&self, rhs: Self) -> Option<Self> {
        self.checked_mul(rhs.checked_powi(-1)?)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts: Vec<String> = [
            (self.currency, "[currency]"),
            (self.mass, "[mass]"),
            (self.time, "[time]"),
            (self.temperature, "[temperature]"),
            (self.population, "[population]"),
        ]
        .into_iter()
        .filter(|(exp, _)| *exp != 0)
        .map(|(exp, symbol)| match exp {
            1 => symbol.to_string(),
            _ => format!("{symbol}^{exp}"),
        })
        .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitInfo {
    pub dimension: Dimension,
    /// Multiplier to the reference unit of the dimension
    pub factor: f64,
}

impl UnitInfo {
    const fn new(dimension: Dimension, factor: f64) -> Self {
        Self { dimension, factor }
    }
}

/// Molecular weight ratio C/CO2 = 12/44.
pub const C_TO_CO2_RATIO: f64 = 12.0 / 44.0;

const MASS_PREFIXES: [(&str, f64); 4] = [("", 1e3), ("k", 1e6), ("M", 1e9), ("G", 1e12)];

pub static UNIT_REGISTRY: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

#[derive(Debug)]
pub struct UnitRegistry {
    units: HashMap<String, UnitInfo>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            units: HashMap::new(),
        };
        registry.register_dimensionless_units();
        registry.register_currency_units();
        registry.register_mass_units();
        registry.register_time_units();
        registry.register_temperature_units();
        registry.register_population_units();
        registry
    }

    pub fn lookup(&self, symbol: &str) -> Option<UnitInfo> {
        self.units.get(symbol).copied()
    }

    fn insert(&mut self, symbols: &[&str], info: UnitInfo) {
        for symbol in symbols {
            self.units.insert(symbol.to_string(), info);
        }
    }

    fn register_dimensionless_units(&mut self) {
        let none = Dimension::dimensionless();
        self.insert(&["1", "dimensionless"], UnitInfo::new(none, 1.0));
        self.insert(&["thousand"], UnitInfo::new(none, 1e3));
        self.insert(&["million"], UnitInfo::new(none, 1e6));
        self.insert(&["billion"], UnitInfo::new(none, 1e9));
        self.insert(&["trillion"], UnitInfo::new(none, 1e12));
        self.insert(&["percent", "%"], UnitInfo::new(none, 1e-2));
        self.insert(&["ppm"], UnitInfo::new(none, 1e-6));
        self.insert(&["ppb"], UnitInfo::new(none, 1e-9));
    }

    fn register_currency_units(&mut self) {
        // Price-year variants are treated as the same currency
        self.insert(
            &["USD", "USD2005", "USD2010", "dollar"],
            UnitInfo::new(Dimension::CURRENCY, 1.0),
        );
    }

    fn register_mass_units(&mut self) {
        self.insert(&["kg"], UnitInfo::new(Dimension::MASS, 1.0));
        for (prefix, factor) in MASS_PREFIXES {
            self.insert(
                &[format!("{prefix}t").as_str(), format!("{prefix}tC").as_str()],
                UnitInfo::new(Dimension::MASS, factor),
            );
            self.insert(
                &[format!("{prefix}tCO2").as_str()],
                UnitInfo::new(Dimension::MASS, factor * C_TO_CO2_RATIO),
            );
        }
    }

    fn register_time_units(&mut self) {
        self.insert(&["yr", "year", "years", "a"], UnitInfo::new(Dimension::TIME, 1.0));
        self.insert(&["decade"], UnitInfo::new(Dimension::TIME, 10.0));
    }

    fn register_temperature_units(&mut self) {
        // Temperature differences only, so degrees Celsius and kelvin coincide
        self.insert(
            &["K", "degC", "delta_degC"],
            UnitInfo::new(Dimension::TEMPERATURE, 1.0),
        );
    }

    fn register_population_units(&mut self) {
        self.insert(
            &["people", "person", "persons"],
            UnitInfo::new(Dimension::POPULATION, 1.0),
        );
    }
}
