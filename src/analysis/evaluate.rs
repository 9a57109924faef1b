use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Problem, Ranking, Scenario, ScoringMethod};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Worker threads used to score scenarios. `None` uses the global rayon pool.
    pub workers: Option<usize>,
}

/// Ranking produced for one scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub id: usize,
    pub result: Result<Ranking, Error>,
}

/// Score every scenario against `base` in parallel. Results are returned in scenario order, and a
/// scenario that fails to score does not affect the others.
pub fn evaluate<M>(
    method: &M,
    base: &Problem,
    scenarios: &[Scenario],
    config: &EvaluationConfig,
) -> Result<Vec<Evaluation>, Error>
where
    M: ScoringMethod + ?Sized,
{
    let evaluations = run(config, || {
        scenarios
            .par_iter()
            .map(|scenario| score(method, base, scenario))
            .collect::<Vec<Evaluation>>()
    })?;
    log_batch(&evaluations);
    Ok(evaluations)
}

/// Like [`evaluate`] for Monte Carlo output. A sample that failed to generate keeps its error and
/// is numbered by its position in `samples`.
pub fn evaluate_samples<M>(
    method: &M,
    base: &Problem,
    samples: &[Result<Scenario, Error>],
    config: &EvaluationConfig,
) -> Result<Vec<Evaluation>, Error>
where
    M: ScoringMethod + ?Sized,
{
    let evaluations = run(config, || {
        samples
            .par_iter()
            .enumerate()
            .map(|(index, sample)| match sample {
                Ok(scenario) => score(method, base, scenario),
                Err(err) => Evaluation {
                    id: index,
                    result: Err(err.clone()),
                },
            })
            .collect::<Vec<Evaluation>>()
    })?;
    log_batch(&evaluations);
    Ok(evaluations)
}

fn score<M>(method: &M, base: &Problem, scenario: &Scenario) -> Evaluation
where
    M: ScoringMethod + ?Sized,
{
    let result = scenario
        .resolve(base)
        .and_then(|problem| method.rank(problem.matrix, problem.weights, problem.types));
    Evaluation {
        id: scenario.id,
        result,
    }
}

fn run<T, F>(config: &EvaluationConfig, job: F) -> Result<T, Error>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match config.workers {
        None => Ok(job()),
        Some(0) => Err(Error::invalid("at least one worker is required")),
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|err| Error::invalid(format!("failed to start workers: {err}")))?;
            Ok(pool.install(job))
        }
    }
}

fn log_batch(evaluations: &[Evaluation]) {
    let failed = evaluations.iter().filter(|e| e.result.is_err()).count();
    debug!(scenarios = evaluations.len(), failed, "evaluated scenarios");
}
