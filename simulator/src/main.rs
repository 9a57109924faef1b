use anyhow::{bail, ensure, Context as _, Result};
use mcda_sensitivity::{
    analysis::{evaluate_samples, rank_acceptability, Acceptability, EvaluationConfig},
    budget::Budget,
    compromise::{borda, hq_compromise, HqConfig},
    methods::WeightedSum,
    perturbation::{
        monte_carlo_weights, weight_sample_scenarios, MonteCarloConfig, WeightDistribution,
    },
    CriterionType, DecisionMatrix, Problem, Ranking, ScoringMethod as _, WeightVector,
};
use rand::{rngs::SmallRng, SeedableRng};
use std::{io::stdin, time::Instant};
use tracing::info;

const SAMPLES: usize = 10_000;

/// Expects CSV on stdin: a line of criterion types (`b` or `c`), an optional line starting with
/// `w` followed by weights, then one line per alternative.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let lines: Vec<String> = stdin()
        .lines()
        .collect::<Result<_, _>>()
        .context("read stdin")?;
    let mut lines = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty());

    let types = lines
        .next()
        .context("missing criterion types")?
        .split(',')
        .map(|field| match field.trim() {
            "b" => Ok(CriterionType::Benefit),
            "c" => Ok(CriterionType::Cost),
            other => bail!("unknown criterion type {other:?}"),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut weights = None;
    for (index, line) in lines.enumerate() {
        let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let is_weights = fields[0] == "w";
        if is_weights {
            ensure!(index == 0, "weights must directly follow the criterion types");
            fields.remove(0);
        }
        let values = fields
            .iter()
            .map(|f| f.parse::<f64>().with_context(|| format!("invalid value {f:?}")))
            .collect::<Result<Vec<f64>>>()?;
        if is_weights {
            weights = Some(WeightVector::normalize(values)?);
        } else {
            rows.push(values);
        }
    }

    let matrix = DecisionMatrix::new(rows)?;
    let weights = match weights {
        Some(weights) => weights,
        None => WeightVector::equal(matrix.criteria())?,
    };
    let problem = Problem::new(matrix, weights, types)?;
    let base = WeightedSum.rank(problem.matrix(), problem.weights(), problem.types())?;
    println!("base ranking: {:?}", base.order());

    Budget::default().check_samples(SAMPLES, problem.matrix().criteria())?;
    let mut rng = SmallRng::from_entropy();
    let t0 = Instant::now();
    let samples = monte_carlo_weights(
        &mut rng,
        problem.matrix().criteria(),
        &WeightDistribution::uniform(),
        SAMPLES,
        &MonteCarloConfig::default(),
    )?;
    let scenarios = weight_sample_scenarios(samples);
    let evaluations = evaluate_samples(
        &WeightedSum,
        &problem,
        &scenarios,
        &EvaluationConfig::default(),
    )?;
    let rankings: Vec<Ranking> = evaluations
        .into_iter()
        .filter_map(|e| e.result.ok())
        .collect();
    info!(
        samples = SAMPLES,
        ranked = rankings.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "evaluated weight samples"
    );

    let shares = rank_acceptability(&rankings, Acceptability::Share)?;
    println!("rank acceptability (position: share per alternative)");
    for (position, row) in shares.iter().enumerate() {
        let row: Vec<String> = row.iter().map(|s| format!("{s:.4}")).collect();
        println!("{}: {}", position + 1, row.join(","));
    }

    let borda = borda(&rankings)?;
    println!("borda: {:?}", borda.ranking.order());
    let hq = hq_compromise(&rankings, &HqConfig::default())?;
    println!(
        "hq: {:?} consensus_index: {:.4} trust_index: {:.4} converged: {}",
        hq.compromise.ranking.order(),
        hq.consensus_index,
        hq.trust_index,
        hq.converged,
    );
    Ok(())
}
