use crate::{num::STEP_EPSILON, Error, WeightVector};

/// Every weight vector over `criteria` criteria whose components are multiples of `step`.
///
/// Vectors are yielded lazily in ascending lexicographic order of their components, starting at
/// `(0, ..., 0, 1)`. `1 / step` must be an integer.
pub fn weight_scenarios(criteria: usize, step: f64) -> Result<WeightScenarios, Error> {
    let parts = parts(criteria, step)?;
    let mut counts = vec![0; criteria];
    counts[criteria - 1] = parts;
    Ok(WeightScenarios {
        parts,
        counts: Some(counts),
    })
}

/// Number of vectors `weight_scenarios(criteria, step)` yields, `C(K + n - 1, n - 1)` with
/// `K = 1 / step`. `None` if the count does not fit in a `u128`.
pub fn weight_scenario_count(criteria: usize, step: f64) -> Result<Option<u128>, Error> {
    let parts = parts(criteria, step)? as u128;
    let mut count: u128 = 1;
    for i in 1..criteria as u128 {
        // C(K + i, i) = C(K + i - 1, i - 1) * (K + i) / i, exact at every step
        count = match count.checked_mul(parts + i) {
            Some(product) => product / i,
            None => return Ok(None),
        };
    }
    Ok(Some(count))
}

#[derive(Clone, Debug)]
pub struct WeightScenarios {
    parts: usize,
    /// Multiples of `step` per criterion for the next vector, `None` once exhausted.
    counts: Option<Vec<usize>>,
}

impl Iterator for WeightScenarios {
    type Item = WeightVector;

    fn next(&mut self) -> Option<Self::Item> {
        let counts = self.counts.as_mut()?;
        let total = self.parts as f64;
        let weights =
            WeightVector::from_normalized_unchecked(counts.iter().map(|&c| c as f64 / total).collect());

        // Advance to the lexicographic successor: bump the rightmost component that still has
        // units to its right, and move all but one of those units to the last component.
        let last = counts.len() - 1;
        let mut tail = 0;
        let mut advanced = false;
        for i in (0..last).rev() {
            tail += counts[i + 1];
            if tail > 0 {
                counts[i] += 1;
                counts[i + 1..].iter_mut().for_each(|c| *c = 0);
                counts[last] = tail - 1;
                advanced = true;
                break;
            }
        }
        if !advanced {
            self.counts = None;
        }
        Some(weights)
    }
}

impl std::iter::FusedIterator for WeightScenarios {}

fn parts(criteria: usize, step: f64) -> Result<usize, Error> {
    if criteria == 0 {
        return Err(Error::invalid("at least one criterion is required"));
    }
    if !step.is_finite() || (step <= 0.0) || (step > 1.0) {
        return Err(Error::invalid(format!("step must be in (0, 1], got {step}")));
    }
    let inverse = 1.0 / step;
    let parts = inverse.round();
    if (inverse - parts).abs() > STEP_EPSILON * parts {
        return Err(Error::invalid(format!(
            "step {step} does not divide 1 into a whole number of parts"
        )));
    }
    if parts > usize::MAX as f64 {
        return Err(Error::invalid(format!("step {step} is too small")));
    }
    Ok(parts as usize)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{num::assert_within, weights::SUM_TOLERANCE};

    #[test]
    fn halves_over_two_criteria() {
        let vectors: Vec<Vec<f64>> = weight_scenarios(2, 0.5)
            .unwrap()
            .map(WeightVector::into_inner)
            .collect();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![0.5, 0.5], vec![1.0, 0.0]]);
        assert_eq!(weight_scenario_count(2, 0.5), Ok(Some(3)));
    }

    #[test]
    fn lexicographic_without_duplicates() {
        for (criteria, step) in [(1, 0.5), (3, 0.25), (4, 0.1), (5, 0.2)] {
            let vectors: Vec<WeightVector> = weight_scenarios(criteria, step).unwrap().collect();
            assert_eq!(
                Some(vectors.len() as u128),
                weight_scenario_count(criteria, step).unwrap()
            );
            for pair in vectors.windows(2) {
                assert!(pair[0].values() < pair[1].values());
            }
            for w in &vectors {
                assert_eq!(w.len(), criteria);
                assert_within(w.values().iter().sum(), 1.0, SUM_TOLERANCE);
                assert!(w.values().iter().all(|w| *w >= 0.0));
            }
        }
    }

    #[test]
    fn counts() {
        assert_eq!(weight_scenario_count(1, 0.01), Ok(Some(1)));
        assert_eq!(weight_scenario_count(3, 0.1), Ok(Some(66)));
        assert_eq!(weight_scenario_count(10, 0.01), Ok(Some(4_263_421_511_271)));
        assert_eq!(weight_scenario_count(200, 1e-6), Ok(None));
    }

    #[test]
    fn invalid_steps() {
        for step in [0.0, -0.5, 1.5, 0.3, f64::NAN] {
            assert!(matches!(
                weight_scenarios(3, step),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert!(weight_scenarios(0, 0.5).is_err());
    }

    #[test]
    fn lazy() {
        let mut scenarios = weight_scenarios(30, 0.01).unwrap();
        let first = scenarios.next().unwrap();
        assert_eq!(first.values()[29], 1.0);
        assert_eq!(scenarios.next().unwrap().values()[28], 0.01);
    }
}
