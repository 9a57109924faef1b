use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    compromise::{borda, check_rankings, CompromiseResult},
    num::{euclidean_distance, normalize_sum},
    Error, PreferenceOrder, Ranking,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HqConfig {
    pub max_iterations: usize,
    /// Largest change of the consensus rank vector and of the weights treated as converged.
    pub tolerance: f64,
}

impl Default for HqConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HqResult {
    /// Consensus ranking, scored by the consensus rank vector (lower is better).
    pub compromise: CompromiseResult,
    /// Weight of each input ranking in the consensus.
    pub weights: Vec<f64>,
    pub consensus_index: f64,
    pub trust_index: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Half-quadratic compromise: a consensus rank vector robust to outlying rankings.
///
/// Starting from the Borda ranks, each iteration sets `σ = Σ‖Rᵢ - R*‖² / 2k²`, weights every
/// ranking by the Welsch function `exp(-‖Rᵢ - R*‖² / 2σ²)` and moves `R*` to the weighted mean of
/// the rankings. Iteration stops once both `R*` and the weights move less than the tolerance, or
/// when σ is 0 because all rankings agree.
pub fn hq_compromise(rankings: &[Ranking], config: &HqConfig) -> Result<HqResult, Error> {
    let m = check_rankings(rankings)?;
    if !config.tolerance.is_finite() || (config.tolerance < 0.0) {
        return Err(Error::invalid(format!(
            "invalid tolerance {}",
            config.tolerance
        )));
    }

    let k = rankings.len();
    let ranks: Vec<Vec<f64>> = rankings
        .iter()
        .map(|r| r.ranks().into_iter().map(|r| r as f64).collect())
        .collect();
    let mut consensus: Vec<f64> = borda(rankings)?
        .ranking
        .ranks()
        .into_iter()
        .map(|r| r as f64)
        .collect();
    let mut weights = vec![1.0 / k as f64; k];
    let mut sigma = 0.0;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        let distances: Vec<f64> = ranks
            .iter()
            .map(|r| squared_distance(r, &consensus))
            .collect();
        sigma = distances.iter().sum::<f64>() / (2 * k * k) as f64;
        if sigma == 0.0 {
            converged = true;
            break;
        }
        // Shifting by the smallest distance keeps the largest weight at exp(0).
        let nearest = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let alpha: Vec<f64> = distances
            .iter()
            .map(|d| (-(d - nearest) / (2.0 * sigma * sigma)).exp())
            .collect();
        let next_weights = normalize_sum(&alpha)
            .ok_or_else(|| Error::NumericInstability("HQ weights do not sum to 1".into()))?;
        let next_consensus: Vec<f64> = (0..m)
            .map(|a| ranks.iter().zip(&next_weights).map(|(r, w)| w * r[a]).sum())
            .collect();

        let rank_change = euclidean_distance(&next_consensus, &consensus);
        let weight_change = euclidean_distance(&next_weights, &weights);
        consensus = next_consensus;
        weights = next_weights;
        iterations += 1;
        debug!(iterations, sigma, rank_change, weight_change, "HQ iteration");
        if (rank_change <= config.tolerance) && (weight_change <= config.tolerance) {
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(
            max_iterations = config.max_iterations,
            "HQ compromise did not converge"
        );
    }

    let agreement: Vec<f64> = ranks
        .iter()
        .map(|r| {
            r.iter()
                .zip(&consensus)
                .map(|(x, c)| welsch((x - c) * (x - c), sigma))
                .sum()
        })
        .collect();
    let consensus_index = agreement.iter().sum::<f64>() / (m * k) as f64;
    let trust_index = agreement
        .iter()
        .zip(&weights)
        .map(|(a, w)| a * w)
        .sum::<f64>()
        / m as f64;

    Ok(HqResult {
        compromise: CompromiseResult::from_scores(consensus, PreferenceOrder::Ascending)?,
        weights,
        consensus_index,
        trust_index,
        iterations,
        converged,
    })
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn welsch(squared: f64, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return if squared == 0.0 { 1.0 } else { 0.0 };
    }
    (-squared / (2.0 * sigma * sigma)).exp()
}
