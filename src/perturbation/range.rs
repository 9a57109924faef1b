use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    budget::Budget,
    matrix::check_indices,
    num::{grid, STEP_EPSILON},
    scenario::number,
    weights::INPUT_TOLERANCE,
    Cell, DecisionMatrix, Error, Interval, Modification, Param, Scenario, Targets, Variant,
    WeightVector,
};

/// Replace each targeted cell by values from its interval, one scenario per (cell, value).
///
/// With a step, the values are `low, low + step, ...` up to `high`. Without one, only the interval
/// boundaries are used. `budget` caps the number of values taken by a single cell.
pub fn range_matrix(
    matrix: &DecisionMatrix,
    intervals: &Param<Interval>,
    step: Option<&Param<f64>>,
    targets: &Targets,
    budget: &Budget,
) -> Result<Vec<Scenario>, Error> {
    let (alternatives, criteria) = matrix.shape();
    let intervals = intervals.resolve_cells(alternatives, criteria, "intervals")?;
    let steps = step
        .map(|step| step.resolve_cells(alternatives, criteria, "step"))
        .transpose()?;
    if let Some(bad) = steps
        .iter()
        .flatten()
        .flatten()
        .find(|s| !s.is_finite() || **s <= 0.0)
    {
        return Err(Error::invalid(format!("invalid range step {bad}")));
    }
    let cells = targets.resolve(matrix)?;

    let mut scenarios = Vec::new();
    for cell in cells {
        let Cell {
            alternative: a,
            criterion: c,
        } = cell;
        let interval = intervals[a][c];
        let values = match &steps {
            Some(steps) => grid(interval.low(), interval.high(), steps[a][c], budget)?,
            None if interval.width() == 0.0 => vec![interval.low()],
            None => vec![interval.low(), interval.high()],
        };
        for value in values {
            let variant = Variant::Matrix(matrix.with_value(cell, value)?);
            scenarios.push((
                Modification::CellValues {
                    changes: vec![(cell, value)],
                },
                variant,
            ));
        }
    }
    Ok(number(scenarios))
}

/// Step the weights of each group of criteria across their intervals.
///
/// Every criterion of a group takes the values `low, low + step, ...` up to `high`, and the group
/// yields one scenario per combination of those values. The criteria outside the group share the
/// difference to 1 equally. Combinations that push any weight outside `[0, 1]` are skipped, as
/// are combinations of a group covering every criterion that do not sum to 1. Without `groups`,
/// every criterion is varied on its own.
pub fn range_weights(
    weights: &WeightVector,
    intervals: &Param<Interval>,
    step: &Param<f64>,
    groups: Option<&[Vec<usize>]>,
    budget: &Budget,
) -> Result<Vec<Scenario>, Error> {
    let criteria = weights.len();
    let intervals = intervals.resolve_criteria(criteria, "intervals")?;
    let steps = step.resolve_criteria(criteria, "step")?;
    if let Some(bad) = steps.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(Error::invalid(format!("invalid range step {bad}")));
    }
    let groups: Vec<Vec<usize>> = match groups {
        None => (0..criteria).map(|c| vec![c]).collect(),
        Some(groups) => groups
            .iter()
            .map(|group| {
                check_indices(group, criteria, "criterion")?;
                let group: BTreeSet<usize> = group.iter().copied().collect();
                if group.is_empty() {
                    return Err(Error::invalid("criteria groups must not be empty"));
                }
                Ok(group.into_iter().collect())
            })
            .collect::<Result<_, Error>>()?,
    };

    let mut scenarios = Vec::new();
    for group in &groups {
        let values = group
            .iter()
            .map(|&c| grid(intervals[c].low(), intervals[c].high(), steps[c], budget))
            .collect::<Result<Vec<Vec<f64>>, Error>>()?;
        let combinations = values
            .iter()
            .try_fold(1_u128, |n, v| n.checked_mul(v.len() as u128))
            .unwrap_or(u128::MAX);
        budget.check(combinations)?;

        let mut picks = vec![0; group.len()];
        loop {
            let changes: Vec<(usize, f64)> = group
                .iter()
                .zip(&picks)
                .zip(&values)
                .map(|((&c, &i), v)| (c, v[i]))
                .collect();
            match spread(weights, &changes) {
                Some(modified) => scenarios.push((
                    Modification::WeightValues { changes },
                    Variant::Weights(modified),
                )),
                None => debug!(?changes, "infeasible weight values"),
            }
            if !advance(&mut picks, &values) {
                break;
            }
        }
    }
    Ok(number(scenarios))
}

/// Next combination in lexicographic order, the last position moving fastest.
fn advance(picks: &mut [usize], values: &[Vec<f64>]) -> bool {
    for position in (0..picks.len()).rev() {
        picks[position] += 1;
        if picks[position] < values[position].len() {
            return true;
        }
        picks[position] = 0;
    }
    false
}

fn spread(weights: &WeightVector, changes: &[(usize, f64)]) -> Option<WeightVector> {
    let values = weights.values();
    let changed = |c: usize| changes.iter().any(|&(k, _)| k == c);
    let rest = values.len() - changes.len();
    let fixed: f64 = changes.iter().map(|(_, v)| v).sum();

    let mut modified = values.to_vec();
    for &(c, v) in changes {
        modified[c] = v;
    }
    if rest == 0 {
        if (fixed - 1.0).abs() > INPUT_TOLERANCE {
            return None;
        }
    } else {
        let others: f64 = (0..values.len())
            .filter(|&c| !changed(c))
            .map(|c| values[c])
            .sum();
        let share = (1.0 - fixed - others) / rest as f64;
        for c in (0..values.len()).filter(|&c| !changed(c)) {
            modified[c] += share;
        }
    }
    if modified
        .iter()
        .any(|w| !(-STEP_EPSILON..=1.0 + STEP_EPSILON).contains(w))
    {
        return None;
    }
    WeightVector::normalize(modified.into_iter().map(|w| w.clamp(0.0, 1.0)).collect()).ok()
}
