//! Reference scoring methods.

use crate::{CriterionType, DecisionMatrix, Error, Normalized, ScoringMethod, WeightVector};

/// Simple additive weighting over min-max normalized criteria.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedSum;

impl ScoringMethod for WeightedSum {
    fn preferences(
        &self,
        matrix: &DecisionMatrix,
        weights: &WeightVector,
        types: &[CriterionType],
    ) -> Result<Vec<f64>, Error> {
        check_inputs(matrix, weights, types)?;
        let mut scores = vec![0.0; matrix.alternatives()];
        for (criterion, (&weight, &kind)) in weights.values().iter().zip(types).enumerate() {
            let column: Vec<f64> = matrix.column(criterion).collect();
            let (min, max) = bounds(&column);
            let range = max - min;
            for (score, x) in scores.iter_mut().zip(column) {
                let value = match kind {
                    _ if range == 0.0 => 1.0,
                    CriterionType::Benefit => (x - min) / range,
                    CriterionType::Cost => (max - x) / range,
                };
                *score += weight * normalized(value)?.as_f64();
            }
        }
        Ok(scores)
    }
}

/// We use the [weighted product model (WPM)](https://en.wikipedia.org/wiki/Weighted_product_model):
/// benefit criteria are divided by their column maximum, cost criteria divide the column minimum,
/// and the normalized values are multiplied with the weights as exponents. One criterion
/// approaching 0 seriously disadvantages an alternative.
///
/// Cells must be non-negative, and cells of cost criteria must be positive.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedProduct;

impl ScoringMethod for WeightedProduct {
    fn preferences(
        &self,
        matrix: &DecisionMatrix,
        weights: &WeightVector,
        types: &[CriterionType],
    ) -> Result<Vec<f64>, Error> {
        check_inputs(matrix, weights, types)?;
        let mut factors = vec![Vec::with_capacity(types.len()); matrix.alternatives()];
        for (criterion, (&weight, &kind)) in weights.values().iter().zip(types).enumerate() {
            let column: Vec<f64> = matrix.column(criterion).collect();
            let (min, max) = bounds(&column);
            if min < 0.0 || (kind == CriterionType::Cost && min == 0.0) {
                return Err(Error::invalid(format!(
                    "weighted product requires positive values, criterion {criterion} has {min}"
                )));
            }
            for (row, x) in factors.iter_mut().zip(column) {
                let value = match kind {
                    CriterionType::Benefit if max == 0.0 => 1.0,
                    CriterionType::Benefit => x / max,
                    CriterionType::Cost => min / x,
                };
                row.push(normalized(normalized(value)?.as_f64().powf(weight))?);
            }
        }
        Ok(factors
            .into_iter()
            .map(|f| f.into_iter().product::<Normalized>().as_f64())
            .collect())
    }
}

fn check_inputs(
    matrix: &DecisionMatrix,
    weights: &WeightVector,
    types: &[CriterionType],
) -> Result<(), Error> {
    let criteria = matrix.criteria();
    if (weights.len() != criteria) || (types.len() != criteria) {
        return Err(Error::invalid(format!(
            "{} weights and {} criterion types for {criteria} criteria",
            weights.len(),
            types.len()
        )));
    }
    Ok(())
}

fn bounds(column: &[f64]) -> (f64, f64) {
    column
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &x| {
            (min.min(x), max.max(x))
        })
}

fn normalized(value: f64) -> Result<Normalized, Error> {
    Normalized::clamp(value, 0.0, 1.0)
        .ok_or_else(|| Error::NumericInstability("normalized value is NaN".into()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::num::assert_within;

    fn types() -> Vec<CriterionType> {
        vec![CriterionType::Benefit, CriterionType::Cost]
    }

    #[test]
    fn weighted_sum() {
        let matrix =
            DecisionMatrix::new(vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]).unwrap();
        let weights = WeightVector::new(vec![0.7, 0.3]).unwrap();
        let prefs = WeightedSum.preferences(&matrix, &weights, &types()).unwrap();
        assert_within(prefs[0], 0.3, 1e-12);
        assert_within(prefs[1], 0.5, 1e-12);
        assert_within(prefs[2], 0.7, 1e-12);
        let ranking = WeightedSum.rank(&matrix, &weights, &types()).unwrap();
        assert_eq!(ranking.order(), &[2, 1, 0]);

        let constant = DecisionMatrix::new(vec![vec![5.0], vec![5.0]]).unwrap();
        let prefs = WeightedSum
            .preferences(&constant, &WeightVector::equal(1).unwrap(), &types()[..1])
            .unwrap();
        assert_eq!(prefs, vec![1.0, 1.0]);
    }

    #[test]
    fn weighted_product() {
        let matrix = DecisionMatrix::new(vec![vec![2.0, 4.0], vec![4.0, 2.0]]).unwrap();
        let weights = WeightVector::equal(2).unwrap();
        let prefs = WeightedProduct
            .preferences(&matrix, &weights, &types())
            .unwrap();
        assert_within(prefs[0], 0.5, 1e-12);
        assert_within(prefs[1], 1.0, 1e-12);

        let zero = DecisionMatrix::new(vec![vec![0.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let prefs = WeightedProduct.preferences(&zero, &weights, &types()).unwrap();
        assert_eq!(prefs[0], 0.0);
        let zero_cost = DecisionMatrix::new(vec![vec![1.0, 0.0], vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            WeightedProduct.preferences(&zero_cost, &weights, &types()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn mismatched_inputs() {
        let matrix = DecisionMatrix::new(vec![vec![1.0, 2.0]]).unwrap();
        let weights = WeightVector::equal(3).unwrap();
        assert!(WeightedSum.preferences(&matrix, &weights, &types()).is_err());
        assert!(WeightedProduct
            .rank(&matrix, &WeightVector::equal(2).unwrap(), &types()[..1])
            .is_err());
    }
}
