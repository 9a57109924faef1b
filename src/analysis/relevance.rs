use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::{
    budget::Budget, correlation::weighted_spearman, perturbation::remove_criteria,
    CriterionType, DecisionMatrix, Error, Problem, Ranking, ScoringMethod, Variant, WeightVector,
};

/// Effect of removing one more criterion from the problem of a round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CriterionRemoval {
    /// Index in the original problem.
    pub criterion: usize,
    /// Criteria excluded once this removal is applied, in removal order.
    pub excluded: Vec<usize>,
    /// Weighted Spearman correlation with the ranking before the removal.
    pub correlation: f64,
    /// Sum of absolute preference differences to the ranking before the removal.
    pub distance: f64,
    pub ranking: Ranking,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelevanceRound {
    /// One candidate per criterion still in the problem, in criterion order.
    pub candidates: Vec<CriterionRemoval>,
    /// Index into `candidates` of the removal carried into the next round.
    pub selected: usize,
}

impl RelevanceRound {
    pub fn removal(&self) -> &CriterionRemoval {
        &self.candidates[self.selected]
    }
}

/// Greedily exclude `excluded_criteria` criteria, one per round, always removing the criterion
/// whose absence moves the preferences least. The first such criterion wins ties.
///
/// Weights are equal over the remaining criteria in every round, whatever `problem` carries.
pub fn criteria_relevance<M>(
    method: &M,
    problem: &Problem,
    excluded_criteria: usize,
) -> Result<Vec<RelevanceRound>, Error>
where
    M: ScoringMethod + ?Sized,
{
    let criteria = problem.matrix().criteria();
    if (excluded_criteria == 0) || (excluded_criteria >= criteria) {
        return Err(Error::invalid(format!(
            "cannot exclude {excluded_criteria} of {criteria} criteria"
        )));
    }

    let mut current = Problem::new(
        problem.matrix().clone(),
        WeightVector::equal(criteria)?,
        problem.types().to_vec(),
    )?;
    let mut remaining: Vec<usize> = (0..criteria).collect();
    let mut excluded: Vec<usize> = Vec::with_capacity(excluded_criteria);
    let mut rounds = Vec::with_capacity(excluded_criteria);
    for round in 1..=excluded_criteria {
        let (reference, reference_ranking) =
            score(method, current.matrix(), current.weights(), current.types())?;
        let singles: Vec<Vec<usize>> = (0..remaining.len()).map(|c| vec![c]).collect();
        let mut scenarios = remove_criteria(&current, Some(&singles[..]), &Budget::default())?;

        let candidates = scenarios
            .par_iter()
            .zip(remaining.par_iter())
            .map(|(scenario, &criterion)| {
                let reduced = scenario.resolve(&current)?;
                let (preferences, ranking) =
                    score(method, reduced.matrix, reduced.weights, reduced.types)?;
                let distance = reference
                    .iter()
                    .zip(&preferences)
                    .map(|(a, b)| (a - b).abs())
                    .sum();
                let mut removed = excluded.clone();
                removed.push(criterion);
                Ok(CriterionRemoval {
                    criterion,
                    excluded: removed,
                    correlation: weighted_spearman(&reference_ranking, &ranking)?,
                    distance,
                    ranking,
                })
            })
            .collect::<Result<Vec<CriterionRemoval>, Error>>()?;

        let mut selected = 0;
        for (index, candidate) in candidates.iter().enumerate() {
            if candidate.distance < candidates[selected].distance {
                selected = index;
            }
        }
        let removal = &candidates[selected];
        debug!(
            round,
            criterion = removal.criterion,
            distance = removal.distance,
            correlation = removal.correlation,
            "least relevant criterion"
        );

        excluded.push(remaining.remove(selected));
        current = match scenarios.swap_remove(selected).variant {
            Variant::Problem(reduced) => reduced,
            _ => return Err(Error::invalid("criterion removal kept the full problem")),
        };
        rounds.push(RelevanceRound {
            candidates,
            selected,
        });
    }
    Ok(rounds)
}

fn score<M>(
    method: &M,
    matrix: &DecisionMatrix,
    weights: &WeightVector,
    types: &[CriterionType],
) -> Result<(Vec<f64>, Ranking), Error>
where
    M: ScoringMethod + ?Sized,
{
    let preferences = method.preferences(matrix, weights, types)?;
    if preferences.len() != matrix.alternatives() {
        return Err(Error::Scoring(format!(
            "{} preferences for {} alternatives",
            preferences.len(),
            matrix.alternatives()
        )));
    }
    let ranking = Ranking::from_preferences(&preferences, method.order())?;
    Ok((preferences, ranking))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{methods::WeightedSum, num::assert_within};

    fn problem(weights: Vec<f64>) -> Problem {
        Problem::new(
            DecisionMatrix::new(vec![
                vec![4.0, 1.0, 1.0, 1.0],
                vec![5.0, 4.0, 5.0, 3.0],
                vec![1.0, 3.0, 1.0, 2.0],
                vec![5.0, 1.0, 4.0, 2.0],
            ])
            .unwrap(),
            WeightVector::new(weights).unwrap(),
            vec![CriterionType::Benefit; 4],
        )
        .unwrap()
    }

    #[test]
    fn least_relevant_criteria_go_first() {
        let rounds = criteria_relevance(&WeightedSum, &problem(vec![0.25; 4]), 2).unwrap();
        assert_eq!(rounds.len(), 2);

        let first = &rounds[0];
        let criteria: Vec<usize> = first.candidates.iter().map(|c| c.criterion).collect();
        assert_eq!(criteria, vec![0, 1, 2, 3]);
        assert_eq!(first.selected, 3);
        assert_eq!(first.removal().excluded, vec![3]);
        assert_within(first.removal().distance, 11.0 / 72.0, 1e-9);
        assert_within(first.removal().correlation, 0.88, 1e-9);
        assert_eq!(first.removal().ranking.order(), &[1, 3, 0, 2]);
        assert_within(first.candidates[2].distance, 2.0 / 9.0, 1e-9);
        assert_within(first.candidates[2].correlation, 1.0, 1e-9);

        let second = &rounds[1];
        let criteria: Vec<usize> = second.candidates.iter().map(|c| c.criterion).collect();
        assert_eq!(criteria, vec![0, 1, 2]);
        assert_eq!(second.removal().criterion, 2);
        assert_eq!(second.removal().excluded, vec![3, 2]);
        assert_within(second.removal().distance, 23.0 / 72.0, 1e-9);
        assert!(second
            .candidates
            .iter()
            .all(|c| c.distance >= second.removal().distance));
    }

    #[test]
    fn weights_are_reset_to_equal() {
        let equal = criteria_relevance(&WeightedSum, &problem(vec![0.25; 4]), 3).unwrap();
        let skewed =
            criteria_relevance(&WeightedSum, &problem(vec![0.7, 0.1, 0.1, 0.1]), 3).unwrap();
        let removed = |rounds: &[RelevanceRound]| -> Vec<usize> {
            rounds.iter().map(|r| r.removal().criterion).collect()
        };
        assert_eq!(removed(&equal), removed(&skewed));
        assert_eq!(equal[2].candidates.len(), 2);
    }

    #[test]
    fn exclusion_count_is_checked() {
        for excluded in [0, 4, 5] {
            assert!(matches!(
                criteria_relevance(&WeightedSum, &problem(vec![0.25; 4]), excluded),
                Err(Error::InvalidParameter(_))
            ));
        }
    }
}
