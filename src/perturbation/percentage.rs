use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    budget::Budget,
    num::{grid, STEP_EPSILON},
    scenario::number,
    DecisionMatrix, Direction, Error, Modification, Param, Scenario, Sign, Targets, Variant,
    WeightVector,
};

/// Percentage changes to apply. With a `step`, every multiple of the step up to the percentage is
/// used as a separate level, otherwise only the percentage itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentageChange {
    pub percentages: Param<f64>,
    pub step: Option<f64>,
    pub direction: Param<Direction>,
    /// Cap on the number of levels per percentage.
    #[serde(default)]
    pub budget: Budget,
}

impl PercentageChange {
    pub fn uniform(percent: f64, direction: Direction) -> Self {
        Self {
            percentages: Param::Uniform(percent),
            step: None,
            direction: Param::Uniform(direction),
            budget: Budget::default(),
        }
    }
}

/// One scenario per targeted cell, sign and level: the cell is scaled by `(1 ± level / 100)`.
/// Targeted cells are visited in row-major order, increases before decreases.
pub fn percentage_matrix(
    matrix: &DecisionMatrix,
    change: &PercentageChange,
    targets: &Targets,
) -> Result<Vec<Scenario>, Error> {
    let (alternatives, criteria) = matrix.shape();
    let percentages = change
        .percentages
        .resolve_cells(alternatives, criteria, "percentages")?;
    let directions = change
        .direction
        .resolve_cells(alternatives, criteria, "direction")?;
    let cells = targets.resolve(matrix)?;

    let mut scenarios = Vec::new();
    for cell in cells {
        let levels = levels(
            percentages[cell.alternative][cell.criterion],
            change.step,
            &change.budget,
        )?;
        let value = matrix.get(cell);
        for &sign in directions[cell.alternative][cell.criterion].signs() {
            for &percent in &levels {
                if (sign == Sign::Decrease) && (percent > 100.0) {
                    debug!(?cell, percent, "skipping decrease past zero");
                    continue;
                }
                let modified = value * (1.0 + (sign.factor() * percent / 100.0));
                let variant = Variant::Matrix(matrix.with_value(cell, modified)?);
                scenarios.push((
                    Modification::CellPercentage {
                        cell,
                        sign,
                        percent,
                    },
                    variant,
                ));
            }
        }
    }
    Ok(number(scenarios))
}

/// One scenario per criterion, sign and level. The criterion's weight is scaled by
/// `(1 ± level / 100)` and the remaining weights share the difference in proportion to their
/// current values. Levels that cannot be compensated are skipped.
pub fn percentage_weights(
    weights: &WeightVector,
    change: &PercentageChange,
) -> Result<Vec<Scenario>, Error> {
    let criteria = weights.len();
    let percentages = change
        .percentages
        .resolve_criteria(criteria, "percentages")?;
    let directions = change.direction.resolve_criteria(criteria, "direction")?;

    let mut scenarios = Vec::new();
    for criterion in 0..criteria {
        let levels = levels(percentages[criterion], change.step, &change.budget)?;
        for &sign in directions[criterion].signs() {
            for &percent in &levels {
                let delta = sign.factor() * percent / 100.0;
                match rescale(weights, criterion, delta) {
                    Some(modified) => scenarios.push((
                        Modification::WeightPercentage {
                            criterion,
                            sign,
                            percent,
                        },
                        Variant::Weights(modified),
                    )),
                    None => debug!(criterion, ?sign, percent, "infeasible weight change"),
                }
            }
        }
    }
    Ok(number(scenarios))
}

fn levels(percent: f64, step: Option<f64>, budget: &Budget) -> Result<Vec<f64>, Error> {
    if !percent.is_finite() || (percent < 0.0) {
        return Err(Error::invalid(format!("invalid percentage {percent}")));
    }
    match step {
        None => Ok(vec![percent]),
        Some(step) if !step.is_finite() || (step <= 0.0) => {
            Err(Error::invalid(format!("invalid percentage step {step}")))
        }
        Some(step) if percent + STEP_EPSILON < step => Ok(vec![]),
        Some(step) => grid(step, percent, step, budget),
    }
}

fn rescale(weights: &WeightVector, criterion: usize, delta: f64) -> Option<WeightVector> {
    let values = weights.values();
    let target = values[criterion] * (1.0 + delta);
    if !(0.0..=1.0 + STEP_EPSILON).contains(&target) {
        return None;
    }
    let rest = 1.0 - values[criterion];
    let new_rest = (1.0 - target).max(0.0);
    let factor = if rest > STEP_EPSILON {
        new_rest / rest
    } else if new_rest <= STEP_EPSILON {
        0.0
    } else {
        return None;
    };
    let modified: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, w)| if i == criterion { target } else { w * factor })
        .collect();
    WeightVector::normalize(modified).ok()
}
