use crate::errors::{RSIAMError, RSIAMResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Time = f64;

/// Ordered calendar years of the model time grid.
///
/// Step `t` corresponds to `year(t)`. Steps may be non-uniform; `dt(t)` is the
/// size of the step ending at `t`, and `dt(0)` is defined as the size of the
/// first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    years: Array1<Time>,
}

impl TimeAxis {
    /// Create a time axis from calendar years.
    ///
    /// The years must be finite and strictly increasing, with at least one value.
    pub fn from_values(years: Array1<Time>) -> RSIAMResult<Self> {
        if years.is_empty() {
            return Err(RSIAMError::InvalidTimeAxis(
                "at least one year is required".to_string(),
            ));
        }
        if years.iter().any(|y| !y.is_finite()) {
            return Err(RSIAMError::InvalidTimeAxis(
                "years must be finite".to_string(),
            ));
        }
        if let Some(w) = years
            .windows(2)
            .into_iter()
            .find(|w| w[1] <= w[0])
        {
            return Err(RSIAMError::InvalidTimeAxis(format!(
                "years must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }
        Ok(Self { years })
    }

    /// Uniform axis from `start` up to and including `end`.
    pub fn uniform(start: Time, end: Time, step: Time) -> RSIAMResult<Self> {
        let finite = start.is_finite() && end.is_finite() && step.is_finite();
        if !finite || step <= 0.0 || end < start {
            return Err(RSIAMError::InvalidTimeAxis(format!(
                "cannot build a grid from {start} to {end} with step {step}"
            )));
        }
        let n = ((end - start) / step).floor() as usize + 1;
        Self::from_values(Array1::from_iter((0..n).map(|i| start + i as Time * step)))
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn year(&self, t: usize) -> Time {
        self.years[t]
    }

    pub fn begin_year(&self) -> Time {
        self.years[0]
    }

    pub fn dt(&self, t: usize) -> Time {
        match (t, self.years.len()) {
            (_, 1) => 1.0,
            (0, _) => self.years[1] - self.years[0],
            _ => self.years[t] - self.years[t - 1],
        }
    }

    pub fn values(&self) -> &Array1<Time> {
        &self.years
    }
}
