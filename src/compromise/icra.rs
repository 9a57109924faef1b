use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    compromise::{borda, CompromiseResult},
    correlation::weighted_spearman,
    CriterionType, DecisionMatrix, Error, Ranking, ScoringMethod, WeightVector,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IcraConfig {
    pub max_iterations: usize,
    /// Rounds without a new lowest disagreement before giving up.
    pub patience: usize,
    /// Weight of each method when it scores the preference table. Equal weights by default.
    pub weights: Option<Vec<f64>>,
}

impl Default for IcraConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            patience: 3,
            weights: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcraStop {
    /// All methods produced the same ranking.
    Agreement,
    /// Disagreement did not improve for `patience` rounds.
    Stalled,
    IterationLimit,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IcraRound {
    /// Sum over alternatives and methods of squared deviations from the mean rank.
    pub disagreement: f64,
    /// Weighted Spearman correlation of each method's ranking with its ranking from the previous
    /// round.
    pub correlations: Vec<f64>,
    /// Preferences each method produced this round.
    pub preferences: Vec<Vec<f64>>,
    pub rankings: Vec<Ranking>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IcraResult {
    /// Borda consensus over `rankings`.
    pub compromise: CompromiseResult,
    /// Preference table of the round with the lowest disagreement, one vector per method.
    pub preferences: Vec<Vec<f64>>,
    pub rankings: Vec<Ranking>,
    pub disagreement: f64,
    /// Round the returned snapshot comes from, 0 for the initial preferences.
    pub best_round: usize,
    pub iterations: usize,
    pub stop: IcraStop,
    pub history: Vec<IcraRound>,
}

/// Iterative compromise ranking analysis.
///
/// `preferences[i]` holds the preferences method `i` assigned to the alternatives. Each round the
/// current preferences form a decision matrix with one column per method, and every method scores
/// that matrix to produce the next round's preferences. A method ranking smaller values first
/// treats the columns as costs. The round with the lowest rank disagreement is kept, so a later
/// regression never replaces a better snapshot.
pub fn icra(
    methods: &[&dyn ScoringMethod],
    preferences: Vec<Vec<f64>>,
    config: &IcraConfig,
) -> Result<IcraResult, Error> {
    let k = methods.len();
    if k < 2 {
        return Err(Error::InsufficientRankings(k));
    }
    if preferences.len() != k {
        return Err(Error::invalid(format!(
            "{} preference vectors for {k} methods",
            preferences.len()
        )));
    }
    let m = preferences[0].len();
    if let Some(index) = preferences.iter().position(|p| p.len() != m) {
        return Err(Error::RankingLengthMismatch {
            index,
            expected: m,
            found: preferences[index].len(),
        });
    }
    if config.patience == 0 {
        return Err(Error::invalid("patience must be at least 1"));
    }
    let weights = match &config.weights {
        None => WeightVector::equal(k)?,
        Some(weights) if weights.len() != k => {
            return Err(Error::invalid(format!(
                "{} compromise weights for {k} methods",
                weights.len()
            )))
        }
        Some(weights) => WeightVector::new(weights.clone())?,
    };
    let types: Vec<CriterionType> = methods
        .iter()
        .map(|method| method.order().criterion_type())
        .collect();

    let rankings = rank_all(methods, &preferences)?;
    let mut best = Snapshot {
        disagreement: disagreement(&rankings),
        preferences,
        rankings,
        round: 0,
    };
    let mut current = best.clone();
    let mut history = Vec::new();
    let mut stale = 0;
    let mut stop = IcraStop::IterationLimit;

    if best.disagreement == 0.0 {
        stop = IcraStop::Agreement;
    } else {
        for round in 1..=config.max_iterations {
            let table = preference_table(&current.preferences)?;
            let preferences = methods
                .iter()
                .map(|method| {
                    let values = method.preferences(&table, &weights, &types)?;
                    if values.len() != m {
                        return Err(Error::Scoring(format!(
                            "{} preferences for {m} alternatives",
                            values.len()
                        )));
                    }
                    Ok(values)
                })
                .collect::<Result<Vec<Vec<f64>>, Error>>()?;
            let rankings = rank_all(methods, &preferences)?;
            let correlations = rankings
                .iter()
                .zip(&current.rankings)
                .map(|(new, old)| weighted_spearman(new, old))
                .collect::<Result<Vec<f64>, Error>>()?;
            let deviation = disagreement(&rankings);
            debug!(round, disagreement = deviation, "ICRA round");
            history.push(IcraRound {
                disagreement: deviation,
                correlations,
                preferences: preferences.clone(),
                rankings: rankings.clone(),
            });
            current = Snapshot {
                disagreement: deviation,
                preferences,
                rankings,
                round,
            };

            if current.disagreement < best.disagreement {
                best = current.clone();
                stale = 0;
            } else {
                stale += 1;
            }
            if current.disagreement == 0.0 {
                stop = IcraStop::Agreement;
                break;
            }
            if stale >= config.patience {
                stop = IcraStop::Stalled;
                break;
            }
        }
    }
    if stop == IcraStop::IterationLimit {
        warn!(
            max_iterations = config.max_iterations,
            disagreement = best.disagreement,
            "ICRA did not reach a compromise"
        );
    }

    Ok(IcraResult {
        compromise: borda(&best.rankings)?,
        preferences: best.preferences,
        rankings: best.rankings,
        disagreement: best.disagreement,
        best_round: best.round,
        iterations: history.len(),
        stop,
        history,
    })
}

#[derive(Clone, Debug)]
struct Snapshot {
    preferences: Vec<Vec<f64>>,
    rankings: Vec<Ranking>,
    disagreement: f64,
    round: usize,
}

fn rank_all(
    methods: &[&dyn ScoringMethod],
    preferences: &[Vec<f64>],
) -> Result<Vec<Ranking>, Error> {
    methods
        .iter()
        .zip(preferences)
        .map(|(method, values)| Ranking::from_preferences(values, method.order()))
        .collect()
}

/// Alternatives in rows, one column per method.
fn preference_table(preferences: &[Vec<f64>]) -> Result<DecisionMatrix, Error> {
    let alternatives = preferences[0].len();
    let values = (0..alternatives)
        .flat_map(|a| preferences.iter().map(move |p| p[a]))
        .collect();
    DecisionMatrix::from_vec(alternatives, preferences.len(), values)
}

fn disagreement(rankings: &[Ranking]) -> f64 {
    let ranks: Vec<Vec<usize>> = rankings.iter().map(Ranking::ranks).collect();
    let k = ranks.len() as f64;
    (0..rankings[0].len())
        .map(|a| {
            let mean = ranks.iter().map(|r| r[a] as f64).sum::<f64>() / k;
            ranks
                .iter()
                .map(|r| (r[a] as f64 - mean) * (r[a] as f64 - mean))
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        methods::{WeightedProduct, WeightedSum},
        PreferenceOrder,
    };

    /// Ignores its input and returns the next vector from a fixed cycle.
    struct Cycling {
        calls: AtomicUsize,
        outputs: Vec<Vec<f64>>,
    }

    impl Cycling {
        fn new(outputs: Vec<Vec<f64>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outputs,
            }
        }
    }

    impl ScoringMethod for Cycling {
        fn preferences(
            &self,
            _: &DecisionMatrix,
            _: &WeightVector,
            _: &[CriterionType],
        ) -> Result<Vec<f64>, Error> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.outputs[call % self.outputs.len()].clone())
        }
    }

    #[test]
    fn oscillation_returns_best_snapshot() {
        let fixed = Cycling::new(vec![vec![3.0, 2.0, 1.0]]);
        // reversed (disagreement 4), then nearly agreeing (disagreement 1), repeated
        let oscillating = Cycling::new(vec![vec![1.0, 2.0, 3.0], vec![3.0, 1.0, 2.0]]);
        let methods: [&dyn ScoringMethod; 2] = [&fixed, &oscillating];
        let initial = vec![vec![3.0, 2.0, 1.0], vec![1.0, 2.0, 3.0]];

        let result = icra(&methods, initial, &IcraConfig::default()).unwrap();
        let disagreements: Vec<f64> = result.history.iter().map(|r| r.disagreement).collect();
        assert_eq!(disagreements, vec![4.0, 1.0, 4.0, 1.0, 4.0]);
        assert_eq!(result.stop, IcraStop::Stalled);
        assert_eq!(result.iterations, 5);
        assert_eq!(result.best_round, 2);
        assert_eq!(result.disagreement, 1.0);
        assert_eq!(result.rankings[1].order(), &[0, 2, 1]);
        assert_eq!(result.preferences[1], vec![3.0, 1.0, 2.0]);
        assert_eq!(result.compromise.ranking.order(), &[0, 1, 2]);
        assert_eq!(result.history[1].correlations[0], 1.0);
        assert_eq!(result.history[0].preferences[1], vec![1.0, 2.0, 3.0]);
        assert_eq!(result.history[0].rankings[1].order(), &[2, 1, 0]);
        assert_eq!(result.history[1].rankings[1].order(), &[0, 2, 1]);
        for round in &result.history {
            assert_eq!(round.preferences[0], vec![3.0, 2.0, 1.0]);
            assert_eq!(round.rankings.len(), 2);
        }
    }

    #[test]
    fn iteration_cap_under_oscillation() {
        let fixed = Cycling::new(vec![vec![3.0, 2.0, 1.0]]);
        let oscillating = Cycling::new(vec![vec![1.0, 2.0, 3.0], vec![3.0, 1.0, 2.0]]);
        let methods: [&dyn ScoringMethod; 2] = [&fixed, &oscillating];
        let config = IcraConfig {
            max_iterations: 10,
            patience: 1_000,
            weights: None,
        };
        let initial = vec![vec![3.0, 2.0, 1.0], vec![1.0, 2.0, 3.0]];
        let result = icra(&methods, initial, &config).unwrap();
        assert_eq!(result.stop, IcraStop::IterationLimit);
        assert_eq!(result.iterations, 10);
        assert_eq!(result.disagreement, 1.0);
    }

    #[test]
    fn initial_agreement() {
        let fixed = Cycling::new(vec![vec![3.0, 2.0, 1.0]]);
        let methods: [&dyn ScoringMethod; 2] = [&fixed, &fixed];
        let initial = vec![vec![0.9, 0.5, 0.1], vec![0.8, 0.7, 0.2]];
        let result = icra(&methods, initial, &IcraConfig::default()).unwrap();
        assert_eq!(result.stop, IcraStop::Agreement);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.best_round, 0);
        assert_eq!(fixed.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn real_methods_terminate() {
        let sum = WeightedSum;
        let product = WeightedProduct;
        let methods: [&dyn ScoringMethod; 2] = [&sum, &product];
        let initial = vec![
            vec![0.61, 0.42, 0.83, 0.15, 0.55],
            vec![0.40, 0.75, 0.68, 0.21, 0.34],
        ];
        let config = IcraConfig::default();
        let result = icra(&methods, initial, &config).unwrap();
        assert!(result.iterations <= config.max_iterations);
        assert_eq!(result.history.len(), result.iterations);
        assert!(result
            .history
            .iter()
            .all(|round| round.disagreement >= result.disagreement));
        assert_eq!(result.compromise.ranking.len(), 5);
        assert_eq!(result.rankings.len(), 2);
    }

    #[test]
    fn cost_orientation_follows_method_order() {
        struct Ascending;
        impl ScoringMethod for Ascending {
            fn preferences(
                &self,
                _: &DecisionMatrix,
                _: &WeightVector,
                types: &[CriterionType],
            ) -> Result<Vec<f64>, Error> {
                assert_eq!(types, &[CriterionType::Benefit, CriterionType::Cost]);
                Ok(vec![1.0, 2.0])
            }

            fn order(&self) -> PreferenceOrder {
                PreferenceOrder::Ascending
            }
        }
        let descending = Cycling::new(vec![vec![2.0, 1.0]]);
        let methods: [&dyn ScoringMethod; 2] = [&descending, &Ascending];
        let initial = vec![vec![1.0, 2.0], vec![1.0, 2.0]];
        let result = icra(&methods, initial, &IcraConfig::default()).unwrap();
        assert_eq!(result.stop, IcraStop::Agreement);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn input_contract() {
        let fixed = Cycling::new(vec![vec![1.0, 2.0]]);
        let one: [&dyn ScoringMethod; 1] = [&fixed];
        assert_eq!(
            icra(&one, vec![vec![1.0, 2.0]], &IcraConfig::default()),
            Err(Error::InsufficientRankings(1))
        );
        let two: [&dyn ScoringMethod; 2] = [&fixed, &fixed];
        assert!(matches!(
            icra(&two, vec![vec![1.0, 2.0], vec![1.0]], &IcraConfig::default()),
            Err(Error::RankingLengthMismatch { index: 1, .. })
        ));
        assert!(matches!(
            icra(&two, vec![vec![1.0, 2.0]], &IcraConfig::default()),
            Err(Error::InvalidParameter(_))
        ));
        let config = IcraConfig {
            weights: Some(vec![1.0]),
            ..IcraConfig::default()
        };
        assert!(icra(&two, vec![vec![1.0, 2.0], vec![2.0, 1.0]], &config).is_err());
    }
}
