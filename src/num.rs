use ordered_float::NotNan;

use crate::{budget::Budget, Error};

/// Slack used when deciding whether a stepped value still lands inside its bound.
pub const STEP_EPSILON: f64 = 1e-9;

/// A non-NaN f64 value in the range [0, 1]. Products of normalized values stay normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalized(NotNan<f64>);

impl Normalized {
    pub fn new(value: f64) -> Option<Self> {
        let value = NotNan::new(value).ok()?;
        if value.is_sign_negative() || *value > 1.0 {
            return None;
        }
        Some(Self(value))
    }

    pub fn clamp(value: f64, min: f64, max: f64) -> Option<Self> {
        Self::new(value.clamp(min, max))
    }

    pub fn as_f64(&self) -> f64 {
        self.0.into_inner()
    }
}

impl std::iter::Product for Normalized {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|n| n.0).product())
    }
}

/// Divide every value by the total. Returns `None` when the total is not a positive finite number.
pub fn normalize_sum(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}

/// Scale values to unit euclidean length.
pub fn vector_normalize(values: &[f64]) -> Option<Vec<f64>> {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return None;
    }
    Some(values.iter().map(|v| v / norm).collect())
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Values `low, low + step, ...` up to and including `high`. The last value snaps to `high` when
/// it lands within `STEP_EPSILON` of it. Fails with `ResourceLimit` when the value count exceeds
/// `budget`.
pub fn grid(low: f64, high: f64, step: f64, budget: &Budget) -> Result<Vec<f64>, Error> {
    debug_assert!(step > 0.0);
    let count = ((high - low) / step + STEP_EPSILON).floor().max(0.0);
    let required = if count.is_finite() {
        (count as u128).saturating_add(1)
    } else {
        u128::MAX
    };
    budget.check(required)?;
    Ok((0..=count as usize)
        .map(|i| {
            let value = low + (i as f64 * step);
            if (value - high).abs() <= STEP_EPSILON {
                high
            } else {
                value
            }
        })
        .collect())
}

#[track_caller]
pub fn assert_within(value: f64, expected: f64, tolerance: f64) {
    let diff = (value - expected).abs();
    assert!(
        diff <= tolerance,
        "Expected value of {expected} +- {tolerance} but got {value} which is off by {diff}",
    );
}
