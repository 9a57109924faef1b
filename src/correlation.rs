//! Rank correlation between two rankings of the same alternatives.

use crate::{Error, Ranking};

/// Spearman's rank correlation coefficient, in `[-1, 1]`.
pub fn spearman(a: &Ranking, b: &Ranking) -> Result<f64, Error> {
    let n = check_lengths(a, b)? as f64;
    if n < 2.0 {
        return Ok(1.0);
    }
    let squared: f64 = rank_pairs(a, b).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok(1.0 - (6.0 * squared / (n * (n * n - 1.0))))
}

/// Weighted Spearman correlation. Disagreements near the top of either ranking weigh more than
/// disagreements near the bottom.
pub fn weighted_spearman(a: &Ranking, b: &Ranking) -> Result<f64, Error> {
    let n = check_lengths(a, b)? as f64;
    if n < 2.0 {
        return Ok(1.0);
    }
    let weighted: f64 = rank_pairs(a, b)
        .map(|(x, y)| (x - y) * (x - y) * ((n - x + 1.0) + (n - y + 1.0)))
        .sum();
    let denominator = n.powi(4) + n.powi(3) - n.powi(2) - n;
    Ok(1.0 - (6.0 * weighted / denominator))
}

fn check_lengths(a: &Ranking, b: &Ranking) -> Result<usize, Error> {
    if a.len() != b.len() {
        return Err(Error::RankingLengthMismatch {
            index: 1,
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a.len())
}

fn rank_pairs(a: &Ranking, b: &Ranking) -> impl Iterator<Item = (f64, f64)> {
    a.ranks()
        .into_iter()
        .zip(b.ranks())
        .map(|(x, y)| (x as f64, y as f64))
}
