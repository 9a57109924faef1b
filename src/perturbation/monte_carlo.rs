use rand::{distributions::Uniform, Rng};
use rand_distr::{ChiSquared, Distribution, Normal, Triangular};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    num::normalize_sum, Cell, DecisionMatrix, Error, Interval, Modification, Param, Scenario,
    Targets, Variant, WeightVector,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Draws attempted per sample before it is reported as exhausted.
    pub max_attempts: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self { max_attempts: 100 }
    }
}

/// Distribution individual weight components are drawn from before normalization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WeightDistribution {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Laplace { location: f64, scale: f64 },
    ChiSquared { degrees_of_freedom: f64 },
}

impl WeightDistribution {
    pub fn uniform() -> Self {
        Self::Uniform {
            low: 0.0,
            high: 1.0,
        }
    }

    pub fn normal() -> Self {
        Self::Normal {
            mean: 0.0,
            std_dev: 1.0,
        }
    }

    pub fn triangular() -> Self {
        Self::Triangular {
            min: 0.0,
            mode: 0.5,
            max: 1.0,
        }
    }

    pub fn laplace() -> Self {
        Self::Laplace {
            location: 0.0,
            scale: 1.0,
        }
    }

    pub fn chi_squared() -> Self {
        Self::ChiSquared {
            degrees_of_freedom: 1.0,
        }
    }

    fn sampler(&self) -> Result<Sampler, Error> {
        let invalid = |e: &dyn std::fmt::Display| Error::invalid(format!("{self:?}: {e}"));
        match *self {
            Self::Uniform { low, high } => Sampler::uniform(&Interval::new(low, high)?),
            Self::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || (std_dev < 0.0) {
                    return Err(invalid(&"standard deviation must be finite and non-negative"));
                }
                Normal::new(mean, std_dev)
                    .map(Sampler::Normal)
                    .map_err(|e| invalid(&e))
            }
            Self::Triangular { min, mode, max } => {
                sampled(&Interval::new(min, max)?)?;
                if !(min..=max).contains(&mode) {
                    return Err(invalid(&"mode must lie between min and max"));
                }
                Triangular::new(min, max, mode)
                    .map(Sampler::Triangular)
                    .map_err(|e| invalid(&e))
            }
            Self::Laplace { location, scale } => {
                if !location.is_finite() || !scale.is_finite() || (scale < 0.0) {
                    return Err(invalid(&"scale must be finite and non-negative"));
                }
                Ok(Sampler::Laplace { location, scale })
            }
            Self::ChiSquared { degrees_of_freedom } => {
                if !degrees_of_freedom.is_finite() || (degrees_of_freedom <= 0.0) {
                    return Err(invalid(&"degrees of freedom must be positive"));
                }
                ChiSquared::new(degrees_of_freedom)
                    .map(Sampler::ChiSquared)
                    .map_err(|e| invalid(&e))
            }
        }
    }
}

/// How targeted matrix cells are redrawn from their interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellDistribution {
    #[default]
    Uniform,
    /// Triangular with the mode at the interval midpoint.
    Triangular,
}

#[derive(Clone, Copy, Debug)]
enum Sampler {
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    Triangular(Triangular<f64>),
    Laplace { location: f64, scale: f64 },
    ChiSquared(ChiSquared<f64>),
}

impl Sampler {
    fn uniform(interval: &Interval) -> Result<Self, Error> {
        let interval = sampled(interval)?;
        Ok(Self::Uniform(Uniform::new_inclusive(
            interval.low(),
            interval.high(),
        )))
    }

    fn cell(interval: &Interval, distribution: CellDistribution) -> Result<Self, Error> {
        match distribution {
            CellDistribution::Uniform => Self::uniform(interval),
            CellDistribution::Triangular => {
                sampled(interval)?;
                Triangular::new(interval.low(), interval.high(), interval.midpoint())
                    .map(Self::Triangular)
                    .map_err(|e| Error::invalid(format!("{interval:?}: {e}")))
            }
        }
    }
}

impl Distribution<f64> for Sampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Uniform(d) => d.sample(rng),
            Self::Normal(d) => d.sample(rng),
            Self::Triangular(d) => d.sample(rng),
            Self::ChiSquared(d) => d.sample(rng),
            // inverse CDF
            Self::Laplace { location, scale } => {
                let u = rng.gen::<f64>() - 0.5;
                location - (scale * u.signum() * (1.0 - (2.0 * u.abs())).ln())
            }
        }
    }
}

/// Draw `samples` independent weight vectors over `criteria` criteria. Each component is drawn
/// from `distribution` and clipped at 0 before the vector is normalized to sum to 1. Draws whose
/// clipped sum is not positive are repeated; a sample that stays degenerate for
/// `config.max_attempts` draws fails on its own without affecting the others.
pub fn monte_carlo_weights<R>(
    rng: &mut R,
    criteria: usize,
    distribution: &WeightDistribution,
    samples: usize,
    config: &MonteCarloConfig,
) -> Result<Vec<Result<WeightVector, Error>>, Error>
where
    R: Rng + ?Sized,
{
    if criteria == 0 {
        return Err(Error::invalid("at least one criterion is required"));
    }
    check_config(config)?;
    let sampler = distribution.sampler()?;
    Ok((0..samples)
        .map(|_| {
            draw_weights(rng, config.max_attempts, |rng| {
                (0..criteria)
                    .map(|_| sampler.sample(rng).max(0.0))
                    .collect()
            })
        })
        .collect())
}

/// Add uniform noise in `[-scale, scale]` to each weight, clip to `[0, 1]`, and renormalize.
pub fn perturbed_weights<R>(
    rng: &mut R,
    weights: &WeightVector,
    samples: usize,
    scale: &Param<f64>,
    config: &MonteCarloConfig,
) -> Result<Vec<Result<WeightVector, Error>>, Error>
where
    R: Rng + ?Sized,
{
    check_config(config)?;
    let scales = scale.resolve_criteria(weights.len(), "perturbation scale")?;
    check_scales(scales.iter())?;
    Ok((0..samples)
        .map(|_| {
            draw_weights(rng, config.max_attempts, |rng| {
                weights
                    .values()
                    .iter()
                    .zip(&scales)
                    .map(|(w, s)| (w + rng.gen_range(-s..=*s)).clamp(0.0, 1.0))
                    .collect()
            })
        })
        .collect())
}

/// Number weight samples as scenarios so they can be evaluated against a base problem.
pub fn weight_sample_scenarios(
    samples: Vec<Result<WeightVector, Error>>,
) -> Vec<Result<Scenario, Error>> {
    samples
        .into_iter()
        .enumerate()
        .map(|(index, sample)| {
            sample.map(|weights| Scenario {
                id: index,
                modification: Modification::Sample { index },
                variant: Variant::Weights(weights),
            })
        })
        .collect()
}

/// Redraw the targeted cells from their intervals, independently for every sample.
pub fn monte_carlo_matrix<R>(
    rng: &mut R,
    matrix: &DecisionMatrix,
    intervals: &Param<Interval>,
    targets: &Targets,
    samples: usize,
    distribution: CellDistribution,
) -> Result<Vec<Result<Scenario, Error>>, Error>
where
    R: Rng + ?Sized,
{
    let (alternatives, criteria) = matrix.shape();
    let intervals = intervals.resolve_cells(alternatives, criteria, "intervals")?;
    let samplers = targets
        .resolve(matrix)?
        .into_iter()
        .map(|cell| {
            let interval = intervals[cell.alternative][cell.criterion];
            Ok((cell, Sampler::cell(&interval, distribution)?))
        })
        .collect::<Result<Vec<(Cell, Sampler)>, Error>>()?;
    Ok((0..samples)
        .map(|index| {
            let changes: Vec<(Cell, f64)> = samplers
                .iter()
                .map(|(cell, sampler)| (*cell, sampler.sample(rng)))
                .collect();
            sample_scenario(matrix, index, &changes)
        })
        .collect())
}

/// Add uniform noise in `[-scale, scale]` to every cell.
pub fn perturbed_matrix<R>(
    rng: &mut R,
    matrix: &DecisionMatrix,
    samples: usize,
    scale: &Param<f64>,
) -> Result<Vec<Result<Scenario, Error>>, Error>
where
    R: Rng + ?Sized,
{
    let (alternatives, criteria) = matrix.shape();
    let scales = scale.resolve_cells(alternatives, criteria, "perturbation scale")?;
    check_scales(scales.iter().flatten())?;
    let cells = Targets::All.resolve(matrix)?;
    Ok((0..samples)
        .map(|index| {
            let changes: Vec<(Cell, f64)> = cells
                .iter()
                .map(|&cell| {
                    let s = scales[cell.alternative][cell.criterion];
                    (cell, matrix.get(cell) + rng.gen_range(-s..=s))
                })
                .collect();
            sample_scenario(matrix, index, &changes)
        })
        .collect())
}

fn sample_scenario(
    matrix: &DecisionMatrix,
    index: usize,
    changes: &[(Cell, f64)],
) -> Result<Scenario, Error> {
    let variant = Variant::Matrix(matrix.with_values(changes)?);
    Ok(Scenario {
        id: index,
        modification: Modification::Sample { index },
        variant,
    })
}

fn draw_weights<R, F>(rng: &mut R, max_attempts: usize, mut draw: F) -> Result<WeightVector, Error>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Vec<f64>,
{
    for _ in 0..max_attempts {
        let values = draw(rng);
        if values.iter().any(|v| !v.is_finite()) {
            continue;
        }
        if let Some(normalized) = normalize_sum(&values) {
            return Ok(WeightVector::from_normalized_unchecked(normalized));
        }
    }
    debug!(max_attempts, "weight sample exhausted");
    Err(Error::GenerationExhausted {
        attempts: max_attempts,
    })
}

fn check_config(config: &MonteCarloConfig) -> Result<(), Error> {
    if config.max_attempts == 0 {
        return Err(Error::invalid("max_attempts must be at least 1"));
    }
    Ok(())
}

/// Intervals are drawn from only when their width, scaled to the unit draw, is finite.
fn sampled(interval: &Interval) -> Result<&Interval, Error> {
    if !(interval.width() / (1.0 - f64::EPSILON)).is_finite() {
        return Err(Error::InvalidRange {
            low: interval.low(),
            high: interval.high(),
        });
    }
    Ok(interval)
}

/// Noise is drawn from `[-s, s]`, so `2s` must be finite.
fn check_scales<'s>(mut scales: impl Iterator<Item = &'s f64>) -> Result<(), Error> {
    match scales.find(|s| !(2.0 * **s).is_finite() || s.is_sign_negative()) {
        Some(s) => Err(Error::invalid(format!("invalid perturbation scale {s}"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::SmallRng, SeedableRng as _};

    use super::*;
    use crate::{num::assert_within, weights::SUM_TOLERANCE};

    fn component_means(samples: &[Result<WeightVector, Error>], criteria: usize) -> Vec<f64> {
        let mut sums = vec![0.0; criteria];
        for sample in samples {
            for (sum, w) in sums.iter_mut().zip(sample.as_ref().unwrap().values()) {
                *sum += w;
            }
        }
        sums.into_iter()
            .map(|s| s / samples.len() as f64)
            .collect()
    }

    #[test]
    fn uniform_weights_converge_to_equal_share() {
        let mut rng = SmallRng::seed_from_u64(7);
        let config = MonteCarloConfig::default();
        let distribution = WeightDistribution::uniform();
        for (samples, tolerance) in [(1_000, 0.03), (10_000, 0.01)] {
            let weights =
                monte_carlo_weights(&mut rng, 3, &distribution, samples, &config).unwrap();
            assert_eq!(weights.len(), samples);
            for mean in component_means(&weights, 3) {
                assert_within(mean, 1.0 / 3.0, tolerance);
            }
        }
    }

    #[test]
    fn every_distribution_yields_valid_weights() {
        let mut rng = SmallRng::seed_from_u64(11);
        let config = MonteCarloConfig::default();
        for distribution in [
            WeightDistribution::uniform(),
            WeightDistribution::normal(),
            WeightDistribution::triangular(),
            WeightDistribution::laplace(),
            WeightDistribution::chi_squared(),
        ] {
            let samples = monte_carlo_weights(&mut rng, 4, &distribution, 200, &config).unwrap();
            for sample in samples {
                let w = sample.unwrap();
                assert_eq!(w.len(), 4);
                assert_within(w.values().iter().sum(), 1.0, SUM_TOLERANCE);
                assert!(w.values().iter().all(|w| *w >= 0.0));
            }
        }
    }

    #[test]
    fn invalid_distribution_parameters() {
        let mut rng = SmallRng::seed_from_u64(0);
        let config = MonteCarloConfig::default();
        for distribution in [
            WeightDistribution::Uniform {
                low: 1.0,
                high: 0.0,
            },
            WeightDistribution::Normal {
                mean: 0.0,
                std_dev: -1.0,
            },
            WeightDistribution::Triangular {
                min: 0.0,
                mode: 2.0,
                max: 1.0,
            },
            WeightDistribution::Laplace {
                location: 0.0,
                scale: -1.0,
            },
            WeightDistribution::ChiSquared {
                degrees_of_freedom: 0.0,
            },
        ] {
            assert!(monte_carlo_weights(&mut rng, 3, &distribution, 10, &config).is_err());
        }
        assert!(
            monte_carlo_weights(&mut rng, 0, &WeightDistribution::uniform(), 10, &config).is_err()
        );
    }

    #[test]
    fn degenerate_samples_fail_individually() {
        let mut rng = SmallRng::seed_from_u64(3);
        let config = MonteCarloConfig { max_attempts: 5 };
        let hopeless = WeightDistribution::Normal {
            mean: -100.0,
            std_dev: 1.0,
        };
        let samples = monte_carlo_weights(&mut rng, 3, &hopeless, 3, &config).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples
            .iter()
            .all(|s| s == &Err(Error::GenerationExhausted { attempts: 5 })));

        let config = MonteCarloConfig { max_attempts: 1 };
        let unlikely = WeightDistribution::Normal {
            mean: -1.0,
            std_dev: 1.0,
        };
        let samples = monte_carlo_weights(&mut rng, 1, &unlikely, 200, &config).unwrap();
        assert!(samples.iter().any(|s| s.is_ok()));
        assert!(samples.iter().any(|s| s.is_err()));
    }

    #[test]
    fn noise_on_weights() {
        let mut rng = SmallRng::seed_from_u64(5);
        let base = WeightVector::new(vec![0.5, 0.3, 0.2]).unwrap();
        let samples = perturbed_weights(
            &mut rng,
            &base,
            100,
            &Param::Uniform(0.1),
            &MonteCarloConfig::default(),
        )
        .unwrap();
        for sample in samples {
            let w = sample.unwrap();
            assert_within(w.values().iter().sum(), 1.0, SUM_TOLERANCE);
            assert!(w.values().iter().all(|w| (0.0..=1.0).contains(w)));
        }
        let unchanged = perturbed_weights(
            &mut rng,
            &base,
            1,
            &Param::Uniform(0.0),
            &MonteCarloConfig::default(),
        )
        .unwrap();
        assert_eq!(unchanged[0].as_ref().unwrap(), &base);
        assert!(perturbed_weights(
            &mut rng,
            &base,
            1,
            &Param::Uniform(-0.1),
            &MonteCarloConfig::default()
        )
        .is_err());
    }

    #[test]
    fn matrix_cells_redrawn_within_interval() {
        let mut rng = SmallRng::seed_from_u64(9);
        let base = DecisionMatrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let interval = Interval::new(10.0, 20.0).unwrap();
        let targets = Targets::Cells(vec![Cell::new(1, 0)]);
        for distribution in [CellDistribution::Uniform, CellDistribution::Triangular] {
            let samples = monte_carlo_matrix(
                &mut rng,
                &base,
                &Param::Uniform(interval),
                &targets,
                50,
                distribution,
            )
            .unwrap();
            assert_eq!(samples.len(), 50);
            for (index, sample) in samples.iter().enumerate() {
                let scenario = sample.as_ref().unwrap();
                assert_eq!(scenario.id, index);
                let matrix = scenario.matrix().unwrap();
                assert_eq!(matrix.shape(), base.shape());
                assert_eq!(matrix.differing_cells(&base), vec![Cell::new(1, 0)]);
                assert!(interval.contains(matrix.get(Cell::new(1, 0))));
            }
        }
    }

    #[test]
    fn matrix_noise() {
        let mut rng = SmallRng::seed_from_u64(13);
        let base = DecisionMatrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let samples = perturbed_matrix(
            &mut rng,
            &base,
            20,
            &Param::PerCriterion(vec![0.5, 0.0]),
        )
        .unwrap();
        for sample in samples {
            let matrix = sample.unwrap().matrix().cloned().unwrap();
            for cell in matrix.differing_cells(&base) {
                assert_eq!(cell.criterion, 0);
                assert!((matrix.get(cell) - base.get(cell)).abs() <= 0.5);
            }
        }
    }

    #[test]
    fn unbounded_widths_are_rejected() {
        let mut rng = SmallRng::seed_from_u64(17);
        let config = MonteCarloConfig::default();
        let wide = WeightDistribution::Uniform {
            low: 0.0,
            high: 1e300,
        };
        assert!(monte_carlo_weights(&mut rng, 3, &wide, 10, &config).is_ok());
        for low in [0.0, -f64::MAX] {
            let wider = WeightDistribution::Uniform {
                low,
                high: f64::MAX,
            };
            assert_eq!(
                monte_carlo_weights(&mut rng, 3, &wider, 10, &config),
                Err(Error::InvalidRange {
                    low,
                    high: f64::MAX
                })
            );
        }
        let triangular = WeightDistribution::Triangular {
            min: -f64::MAX,
            mode: 0.0,
            max: f64::MAX,
        };
        assert!(monte_carlo_weights(&mut rng, 3, &triangular, 10, &config).is_err());

        let base = DecisionMatrix::new(vec![vec![1.0, 2.0]]).unwrap();
        let interval = Interval::new(-f64::MAX, f64::MAX).unwrap();
        for distribution in [CellDistribution::Uniform, CellDistribution::Triangular] {
            assert_eq!(
                monte_carlo_matrix(
                    &mut rng,
                    &base,
                    &Param::Uniform(interval),
                    &Targets::All,
                    10,
                    distribution,
                ),
                Err(Error::InvalidRange {
                    low: -f64::MAX,
                    high: f64::MAX
                })
            );
        }

        let weights = WeightVector::equal(2).unwrap();
        assert!(matches!(
            perturbed_weights(
                &mut rng,
                &weights,
                10,
                &Param::Uniform(f64::MAX),
                &config
            ),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            perturbed_matrix(&mut rng, &base, 10, &Param::Uniform(f64::MAX)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn overflowing_samples_fail_individually() {
        let mut rng = SmallRng::seed_from_u64(19);
        let base = DecisionMatrix::new(vec![vec![f64::MAX], vec![1.0]]).unwrap();
        let samples = perturbed_matrix(&mut rng, &base, 64, &Param::Uniform(1e307)).unwrap();
        assert_eq!(samples.len(), 64);
        let mut failed = 0;
        for (index, sample) in samples.iter().enumerate() {
            match sample {
                Ok(scenario) => {
                    assert_eq!(scenario.id, index);
                    assert_eq!(scenario.modification, Modification::Sample { index });
                    assert!(scenario.matrix().unwrap().get(Cell::new(0, 0)).is_finite());
                }
                Err(e) => {
                    assert!(matches!(e, Error::NumericInstability(_)));
                    failed += 1;
                }
            }
        }
        assert!(failed > 0);
        assert!(failed < 64);
    }
}
