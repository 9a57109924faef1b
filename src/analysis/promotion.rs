use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    num::STEP_EPSILON, Cell, DecisionMatrix, Error, Param, Problem, ScoringMethod, Sign, Targets,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Direction each criterion's values are moved in.
    pub directions: Param<Sign>,
    pub step: Param<f64>,
    /// Value each criterion is moved up to, inclusive.
    pub bounds: Param<f64>,
    /// 0-based position each alternative tries to reach. The top position by default.
    pub targets: Option<Vec<usize>>,
    /// Largest number of values tried for a single cell.
    pub max_steps: usize,
}

impl PromotionConfig {
    pub fn new(directions: Param<Sign>, step: Param<f64>, bounds: Param<f64>) -> Self {
        Self {
            directions,
            step,
            bounds,
            targets: None,
            max_steps: 10_000,
        }
    }
}

/// Best position one alternative reached by changing one of its criterion values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Promotion {
    pub cell: Cell,
    pub initial_position: usize,
    pub best_position: usize,
    /// Value that first reached `best_position`, `None` if the position never improved.
    pub value: Option<f64>,
}

/// For every cell, step its value toward the criterion's bound and record the best position the
/// alternative reaches. Stepping a cell stops once the alternative reaches its target position.
pub fn ranking_promotion<M>(
    method: &M,
    problem: &Problem,
    config: &PromotionConfig,
) -> Result<Vec<Promotion>, Error>
where
    M: ScoringMethod + ?Sized,
{
    let matrix = problem.matrix();
    let (alternatives, criteria) = matrix.shape();
    let directions = config.directions.resolve_criteria(criteria, "directions")?;
    let steps = config.step.resolve_criteria(criteria, "step")?;
    let bounds = config.bounds.resolve_criteria(criteria, "bounds")?;
    if let Some(step) = steps.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(Error::invalid(format!("invalid promotion step {step}")));
    }
    if let Some(bound) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(Error::invalid(format!("invalid promotion bound {bound}")));
    }
    let targets = match &config.targets {
        None => vec![0; alternatives],
        Some(targets) if targets.len() != alternatives => {
            return Err(Error::invalid(format!(
                "{} target positions for {alternatives} alternatives",
                targets.len()
            )))
        }
        Some(targets) => targets.clone(),
    };

    let initial = method
        .rank(matrix, problem.weights(), problem.types())?
        .positions();
    let cells = Targets::All.resolve(matrix)?;
    // Step counts are checked before any scoring.
    let counts = cells
        .iter()
        .map(|cell| {
            let c = cell.criterion;
            let distance = (bounds[c] - matrix.get(*cell)) * directions[c].factor();
            let count = (distance.max(0.0) / steps[c] + STEP_EPSILON).floor();
            if count > config.max_steps as f64 {
                return Err(Error::ResourceLimit {
                    required: count as u128,
                    limit: config.max_steps as u128,
                });
            }
            Ok(count as usize)
        })
        .collect::<Result<Vec<usize>, Error>>()?;

    cells
        .par_iter()
        .zip(counts)
        .map(|(&cell, count)| {
            let Cell {
                alternative: a,
                criterion: c,
            } = cell;
            let mut promotion = Promotion {
                cell,
                initial_position: initial[a],
                best_position: initial[a],
                value: None,
            };
            let start = matrix.get(cell);
            for i in 1..=count {
                if promotion.best_position <= targets[a] {
                    break;
                }
                let value = start + (directions[c].factor() * i as f64 * steps[c]);
                let changed = matrix.with_value(cell, value)?;
                let position = position_of(method, problem, &changed, a)?;
                if position < promotion.best_position {
                    promotion.best_position = position;
                    promotion.value = Some(value);
                }
            }
            Ok(promotion)
        })
        .collect()
}

fn position_of<M>(
    method: &M,
    problem: &Problem,
    matrix: &DecisionMatrix,
    alternative: usize,
) -> Result<usize, Error>
where
    M: ScoringMethod + ?Sized,
{
    let ranking = method.rank(matrix, problem.weights(), problem.types())?;
    Ok(ranking.positions()[alternative])
}
