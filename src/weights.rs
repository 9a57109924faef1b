use serde::Serialize;

use crate::{num::normalize_sum, Error};

/// Maximum deviation from 1 accepted for caller-supplied weights.
pub const INPUT_TOLERANCE: f64 = 1e-6;
/// Maximum deviation from 1 of any stored weight vector.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// Non-negative criterion weights summing to 1.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    /// Accepts weights that already sum to 1 within `INPUT_TOLERANCE`. The stored vector is
    /// renormalized so that it sums to 1 within `SUM_TOLERANCE`.
    pub fn new(values: Vec<f64>) -> Result<Self, Error> {
        check_components(&values)?;
        let total: f64 = values.iter().sum();
        if (total - 1.0).abs() > INPUT_TOLERANCE {
            return Err(Error::invalid(format!("weights sum to {total}, expected 1")));
        }
        Self::normalize(values)
    }

    /// Scale non-negative values so that they sum to 1.
    pub fn normalize(values: Vec<f64>) -> Result<Self, Error> {
        check_components(&values)?;
        normalize_sum(&values)
            .map(Self)
            .ok_or_else(|| Error::invalid("weights must have a positive sum"))
    }

    pub fn equal(criteria: usize) -> Result<Self, Error> {
        if criteria == 0 {
            return Err(Error::invalid("at least one criterion is required"));
        }
        Ok(Self(vec![1.0 / criteria as f64; criteria]))
    }

    pub(crate) fn from_normalized_unchecked(values: Vec<f64>) -> Self {
        debug_assert!((values.iter().sum::<f64>() - 1.0).abs() <= SUM_TOLERANCE);
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

fn check_components(values: &[f64]) -> Result<(), Error> {
    if values.is_empty() {
        return Err(Error::invalid("at least one criterion is required"));
    }
    match values.iter().find(|w| !w.is_finite() || w.is_sign_negative()) {
        Some(w) => Err(Error::invalid(format!("invalid weight {w}"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::num::assert_within;

    #[test]
    fn construction() {
        let w = WeightVector::new(vec![0.2, 0.3, 0.5]).unwrap();
        assert_eq!(w.len(), 3);
        assert_within(w.values().iter().sum(), 1.0, SUM_TOLERANCE);

        let w = WeightVector::new(vec![1.0 / 3.0; 3]).unwrap();
        assert_within(w.values().iter().sum(), 1.0, SUM_TOLERANCE);

        assert!(WeightVector::new(vec![0.5, 0.6]).is_err());
        assert!(WeightVector::new(vec![1.5, -0.5]).is_err());
        assert!(WeightVector::new(vec![]).is_err());
        assert!(WeightVector::normalize(vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn normalize_preserves_ratios() {
        let w = WeightVector::normalize(vec![1.0, 3.0]).unwrap();
        assert_eq!(w.values(), &[0.25, 0.75]);
        let w = WeightVector::equal(4).unwrap();
        assert_eq!(w.values(), &[0.25; 4]);
    }
}
