use std::collections::BTreeSet;

use crate::{
    budget::Budget, matrix::check_indices, scenario::number, DecisionMatrix, Error,
    Modification, Problem, Scenario, Variant, WeightVector,
};

/// One scenario per listed alternative, with that alternative's row removed.
pub fn remove_alternatives(
    matrix: &DecisionMatrix,
    alternatives: &[usize],
) -> Result<Vec<Scenario>, Error> {
    check_indices(alternatives, matrix.alternatives(), "alternative")?;
    let scenarios = alternatives
        .iter()
        .map(|&alternative| {
            let reduced = matrix.without_alternatives(&[alternative])?;
            Ok((
                Modification::RemovedAlternatives {
                    alternatives: vec![alternative],
                },
                Variant::Matrix(reduced),
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(number(scenarios))
}

/// One scenario per combination of criteria to remove. The removed weight is shared equally by
/// the remaining criteria.
///
/// Without explicit combinations, every proper non-empty subset of the criteria is removed in
/// turn, ordered by size and then lexicographically.
pub fn remove_criteria(
    problem: &Problem,
    combinations: Option<&[Vec<usize>]>,
    budget: &Budget,
) -> Result<Vec<Scenario>, Error> {
    let criteria = problem.matrix().criteria();
    let generated;
    let combinations = match combinations {
        Some(combinations) => {
            budget.check(combinations.len() as u128)?;
            combinations
        }
        None => {
            let required = 1_u128
                .checked_shl(criteria as u32)
                .map_or(u128::MAX, |subsets| subsets.saturating_sub(2));
            budget.check(required)?;
            generated = proper_subsets(criteria);
            &generated[..]
        }
    };
    let scenarios = combinations
        .iter()
        .map(|combination| {
            check_indices(combination, criteria, "criterion")?;
            let removed: BTreeSet<usize> = combination.iter().copied().collect();
            let removed: Vec<usize> = removed.into_iter().collect();
            let matrix = problem.matrix().without_criteria(&removed)?;

            let weights = problem.weights().values();
            let removed_weight: f64 = removed.iter().map(|&c| weights[c]).sum();
            let share = removed_weight / (criteria - removed.len()) as f64;
            let kept = |c: &usize| !removed.contains(c);
            let weights = WeightVector::normalize(
                (0..criteria)
                    .filter(kept)
                    .map(|c| weights[c] + share)
                    .collect(),
            )?;
            let types = (0..criteria)
                .filter(kept)
                .map(|c| problem.types()[c])
                .collect();

            Ok((
                Modification::RemovedCriteria { criteria: removed },
                Variant::Problem(Problem::new(matrix, weights, types)?),
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(number(scenarios))
}

fn proper_subsets(n: usize) -> Vec<Vec<usize>> {
    let mut subsets = Vec::new();
    for size in 1..n {
        let mut combination: Vec<usize> = (0..size).collect();
        loop {
            subsets.push(combination.clone());
            // rightmost position that can still move right
            let Some(i) = (0..size).rev().find(|&i| combination[i] < n - size + i) else {
                break;
            };
            combination[i] += 1;
            for j in (i + 1)..size {
                combination[j] = combination[j - 1] + 1;
            }
        }
    }
    subsets
}
