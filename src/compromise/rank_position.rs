use crate::{
    compromise::{check_rankings, CompromiseResult},
    Error, PreferenceOrder, Ranking,
};

/// Rank position method: each alternative scores `1 / Σ 1/rank`, smaller is better.
pub fn rank_position(rankings: &[Ranking]) -> Result<CompromiseResult, Error> {
    let m = check_rankings(rankings)?;
    let mut reciprocal = vec![0.0; m];
    for ranking in rankings {
        for (sum, rank) in reciprocal.iter_mut().zip(ranking.ranks()) {
            *sum += 1.0 / rank as f64;
        }
    }
    let scores = reciprocal.into_iter().map(|r| 1.0 / r).collect();
    CompromiseResult::from_scores(scores, PreferenceOrder::Ascending)
}
