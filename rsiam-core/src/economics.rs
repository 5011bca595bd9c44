//! Economic dynamics library.
//!
//! Pure functions used by the growth and damage components, plus the TFP
//! calibration routine that is run once before a model is assembled.
//!
//! Every function that raises a value to a real power goes through
//! [`checked_powf`], so a fractional power of a negative base or a
//! non-finite result is reported as a [`NumericalError`] instead of leaking
//! NaN or infinity into the assembled system.

use crate::errors::{NumericalError, RSIAMError, RSIAMResult};
use crate::timeseries::{FloatValue, Time};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Pure rate of time preference used for the NPV accounting (1/yr)
pub const DISCOUNT_RATE: FloatValue = 0.05;

/// Added to the optimal adaptation base so the level is defined at zero damages
pub const ADAPTATION_EPSILON: FloatValue = 0.001;

/// Temperature-rate scale of the hyperbolic-tangent smoothing (K/yr)
pub const SMOOTHING_SCALE: FloatValue = 1e-3;

/// Threshold below which a denominator is treated as zero
pub const NEAR_ZERO: FloatValue = 1e-12;

/// `base^exponent`, rejecting fractional powers of negative bases and non-finite results.
pub fn checked_powf(base: FloatValue, exponent: FloatValue, what: &str) -> RSIAMResult<FloatValue> {
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(NumericalError::NegativeBase {
            what: what.to_string(),
            base,
            exponent,
        }
        .into());
    }
    finite(base.powf(exponent), what)
}

/// Pass `value` through if it is finite.
pub fn finite(value: FloatValue, what: &str) -> RSIAMResult<FloatValue> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NumericalError::NonFinite {
            what: what.to_string(),
            value,
        }
        .into())
    }
}

/// `numerator / denominator`, rejecting near-zero denominators.
pub fn checked_div(
    numerator: FloatValue,
    denominator: FloatValue,
    what: &str,
) -> RSIAMResult<FloatValue> {
    if !denominator.is_finite() || denominator.abs() < NEAR_ZERO {
        return Err(NumericalError::NearZeroDenominator {
            what: what.to_string(),
            value: denominator,
        }
        .into());
    }
    finite(numerator / denominator, what)
}

/// Cobb-Douglas output
///
/// $$ Y = TFP \cdot L^{1-\alpha} \cdot K^{\alpha} $$
pub fn gdp(
    tfp: FloatValue,
    labour: FloatValue,
    capital: FloatValue,
    alpha: FloatValue,
) -> RSIAMResult<FloatValue> {
    let labour_term = checked_powf(labour, 1.0 - alpha, "Cobb-Douglas labour term")?;
    let capital_term = checked_powf(capital, alpha, "Cobb-Douglas capital term")?;
    finite(tfp * labour_term * capital_term, "Cobb-Douglas output")
}

/// Rate of change of the capital stock
///
/// $$ \frac{dK}{dt} = \ln(1 - \delta) K + I $$
///
/// Callers integrate the rate over `dt`. The step size itself does not enter the
/// rate; it is accepted so callers can pass the step they integrate over.
pub fn capital_step(
    capital: FloatValue,
    depreciation: FloatValue,
    investment: FloatValue,
    _dt: Time,
) -> RSIAMResult<FloatValue> {
    if !(0.0..1.0).contains(&depreciation) {
        return Err(NumericalError::InvalidDepreciation(depreciation).into());
    }
    finite(
        (1.0 - depreciation).ln() * capital + investment,
        "capital rate of change",
    )
}

/// Historical economic data of one region on its own yearly grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalEconomy {
    pub years: Array1<Time>,
    pub gdp: Array1<FloatValue>,
    pub population: Array1<FloatValue>,
}

/// Implied total factor productivity of a region.
///
/// Capital starts at `initial_capital` and is rolled forward one historical step
/// at a time with [`capital_step`], investing `savings_rate` of historical GDP.
/// The step size is taken from the first two historical years. The returned
/// series is aligned with `history.years`.
pub fn tfp_series(
    history: &HistoricalEconomy,
    initial_capital: FloatValue,
    alpha: FloatValue,
    depreciation: FloatValue,
    savings_rate: FloatValue,
) -> RSIAMResult<Array1<FloatValue>> {
    let n = history.years.len();
    if history.gdp.len() != n || history.population.len() != n {
        return Err(RSIAMError::ShapeMismatch {
            name: "historical GDP and population".to_string(),
            expected: vec![n],
            actual: vec![history.gdp.len(), history.population.len()],
        });
    }
    let dt = if n > 1 {
        history.years[1] - history.years[0]
    } else {
        1.0
    };

    let mut capital = initial_capital;
    let mut tfp = Vec::with_capacity(n);
    for (&gdp_value, &population) in history.gdp.iter().zip(history.population.iter()) {
        let unit_output = gdp(1.0, population, capital, alpha)?;
        tfp.push(checked_div(gdp_value, unit_output, "implied TFP")?);

        let rate = capital_step(capital, depreciation, savings_rate * gdp_value, dt)?;
        capital += rate * dt;
    }
    Ok(Array1::from(tfp))
}

/// Damages as a fraction of GDP
///
/// $$ D(T) = a_1 T + a_2 T^{a_3} $$
///
/// When `t0` is given the damage at that baseline temperature is subtracted,
/// so damages are zero at the reference temperature.
pub fn damage_fraction(
    temperature: FloatValue,
    a1: FloatValue,
    a2: FloatValue,
    a3: FloatValue,
    t0: Option<FloatValue>,
) -> RSIAMResult<FloatValue> {
    let curve = |temp: FloatValue| -> RSIAMResult<FloatValue> {
        Ok(a1 * temp + a2 * checked_powf(temp, a3, "damage fraction")?)
    };
    let damage = curve(temperature)?;
    match t0 {
        Some(t0) => Ok(damage - curve(t0)?),
        None => Ok(damage),
    }
}

/// Derivative of [`damage_fraction`] with respect to temperature
///
/// $$ D'(T) = a_1 + a_2 a_3 T^{a_3 - 1} $$
pub fn damage_rate(
    temperature: FloatValue,
    a1: FloatValue,
    a2: FloatValue,
    a3: FloatValue,
) -> RSIAMResult<FloatValue> {
    Ok(a1 + a2 * a3 * checked_powf(temperature, a3 - 1.0, "damage rate")?)
}

/// Marginal abatement cost at abatement level `a`
pub fn marginal_abatement_cost(
    a: FloatValue,
    factor: FloatValue,
    gamma: FloatValue,
    beta: FloatValue,
) -> RSIAMResult<FloatValue> {
    Ok(gamma * factor * checked_powf(a, beta, "marginal abatement cost")?)
}

/// Abatement cost: the integral of [`marginal_abatement_cost`] from 0 to `a`
pub fn abatement_cost(
    a: FloatValue,
    factor: FloatValue,
    gamma: FloatValue,
    beta: FloatValue,
) -> RSIAMResult<FloatValue> {
    let power = checked_powf(a, beta + 1.0, "abatement cost")?;
    checked_div(gamma * factor * power, beta + 1.0, "abatement cost")
}

/// Cost of adaptation at `level`, as a fraction of GDP
pub fn adaptation_cost(
    level: FloatValue,
    gamma1: FloatValue,
    gamma2: FloatValue,
) -> RSIAMResult<FloatValue> {
    Ok(gamma1 * checked_powf(level, gamma2, "adaptation cost")?)
}

/// Adaptation level at which marginal adaptation cost equals marginal damage reduction
///
/// $$ P^* = \left(\frac{GD}{\gamma_1 \gamma_2} + \epsilon\right)^{1/(\gamma_2 - 1)} $$
///
/// Only meaningful when `gamma1 * gamma2 > 0`.
pub fn optimal_adaptation_level(
    gross_damages: FloatValue,
    gamma1: FloatValue,
    gamma2: FloatValue,
) -> RSIAMResult<FloatValue> {
    let base = checked_div(gross_damages, gamma1 * gamma2, "optimal adaptation level")?
        + ADAPTATION_EPSILON;
    let exponent = checked_div(1.0, gamma2 - 1.0, "optimal adaptation exponent")?;
    checked_powf(base, exponent, "optimal adaptation level")
}

/// Weight of the damage increment for a given temperature rate
///
/// Interpolates between 1 while warming and `perc_reversible` while cooling:
///
/// $$ s = \frac{(\tanh(\dot T / 10^{-3}) + 1)(1 - p)}{2} + p $$
pub fn smoothed_factor(temperature_rate: FloatValue, perc_reversible: FloatValue) -> FloatValue {
    ((temperature_rate / SMOOTHING_SCALE).tanh() + 1.0) * (1.0 - perc_reversible) / 2.0
        + perc_reversible
}

/// Isoelastic utility of per-capita consumption
///
/// The per-capita consumption is squared and raised to half the usual exponent
/// so the base stays non-negative whatever sign the solver gives consumption.
pub fn utility(
    consumption: FloatValue,
    population: FloatValue,
    elasmu: FloatValue,
) -> RSIAMResult<FloatValue> {
    let per_capita = checked_div(consumption, population, "per-capita consumption")?;
    let transformed = checked_powf(
        per_capita * per_capita,
        (1.0 - elasmu) / 2.0,
        "utility",
    )?;
    Ok(checked_div(transformed - 1.0, 1.0 - elasmu, "utility")? - 1.0)
}

/// Discount factor applied to values in `year`
pub fn discount_factor(year: Time, begin_year: Time) -> FloatValue {
    (-DISCOUNT_RATE * (year - begin_year)).exp()
}
