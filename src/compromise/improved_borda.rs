use crate::{
    compromise::{borda::points, check_rankings, CompromiseResult},
    num::vector_normalize,
    Error, PreferenceOrder, Ranking, WeightVector,
};

/// Borda count with per-ranking reliability weights. Without weights every ranking counts the
/// same. Weights are normalized to sum to 1.
pub fn improved_borda(
    rankings: &[Ranking],
    weights: Option<&[f64]>,
) -> Result<CompromiseResult, Error> {
    check_rankings(rankings)?;
    let weights = match weights {
        None => WeightVector::equal(rankings.len())?,
        Some(weights) if weights.len() != rankings.len() => {
            return Err(Error::invalid(format!(
                "{} reliability weights for {} rankings",
                weights.len(),
                rankings.len()
            )))
        }
        Some(weights) => WeightVector::normalize(weights.to_vec())?,
    };
    CompromiseResult::from_scores(
        points(rankings, |k| weights.values()[k]),
        PreferenceOrder::Descending,
    )
}

/// Improved Borda over raw preference values, one vector per method.
///
/// Each method's preferences are scaled to unit length and weighted by the Borda share of the
/// rank they produce. Methods preferring larger values add `norm * (m - rank + 1) / (m(m+1)/2)`,
/// methods preferring smaller values subtract `norm * rank / (m(m+1)/2)`.
pub fn improved_borda_preferences(
    preferences: &[Vec<f64>],
    orders: &[PreferenceOrder],
) -> Result<CompromiseResult, Error> {
    if preferences.len() < 2 {
        return Err(Error::InsufficientRankings(preferences.len()));
    }
    if orders.len() != preferences.len() {
        return Err(Error::invalid(format!(
            "{} preference orders for {} methods",
            orders.len(),
            preferences.len()
        )));
    }
    let m = preferences[0].len();
    if let Some(index) = preferences.iter().position(|p| p.len() != m) {
        return Err(Error::RankingLengthMismatch {
            index,
            expected: m,
            found: preferences[index].len(),
        });
    }

    let total = (m * (m + 1)) as f64 / 2.0;
    let mut scores = vec![0.0; m];
    for (values, &order) in preferences.iter().zip(orders) {
        let norm = vector_normalize(values)
            .ok_or_else(|| Error::NumericInstability("preferences cannot be normalized".into()))?;
        let ranks = Ranking::from_preferences(values, order)?.ranks();
        for (score, (n, rank)) in scores.iter_mut().zip(norm.iter().zip(ranks)) {
            match order {
                PreferenceOrder::Descending => *score += n * (m - rank + 1) as f64 / total,
                PreferenceOrder::Ascending => *score -= n * rank as f64 / total,
            }
        }
    }
    CompromiseResult::from_scores(scores, PreferenceOrder::Descending)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::num::assert_within;

    fn opposed() -> [Ranking; 2] {
        [
            Ranking::from_order(vec![0, 1, 2]).unwrap(),
            Ranking::from_order(vec![2, 1, 0]).unwrap(),
        ]
    }

    #[test]
    fn reliability_decides() {
        let rankings = opposed();
        let result = improved_borda(&rankings, Some(&[3.0, 1.0])).unwrap();
        assert_eq!(result.ranking.order(), &[0, 1, 2]);
        assert_eq!(result.scores, vec![2.5, 2.0, 1.5]);
        let result = improved_borda(&rankings, Some(&[1.0, 3.0])).unwrap();
        assert_eq!(result.ranking.order(), &[2, 1, 0]);
        let result = improved_borda(&rankings, None).unwrap();
        assert_eq!(result.ranking.order(), &[0, 1, 2]);
    }

    #[test]
    fn invalid_weights() {
        let rankings = opposed();
        assert!(improved_borda(&rankings, Some(&[1.0])).is_err());
        assert!(improved_borda(&rankings, Some(&[1.0, -1.0])).is_err());
        assert!(improved_borda(&rankings, Some(&[0.0, 0.0])).is_err());
        assert!(improved_borda(&rankings, Some(&[f64::NAN, 1.0])).is_err());
    }

    #[test]
    fn preference_values() {
        let preferences = vec![vec![0.9, 0.5, 0.1], vec![0.2, 0.1, 0.6]];
        let orders = [PreferenceOrder::Descending, PreferenceOrder::Ascending];
        let result = improved_borda_preferences(&preferences, &orders).unwrap();
        assert_eq!(result.ranking.order(), &[0, 1, 2]);
        assert_within(result.scores[0], 0.330916, 1e-6);
        assert_within(result.scores[1], 0.135094, 1e-6);
        assert_within(result.scores[2], -0.452409, 1e-6);

        assert!(improved_borda_preferences(&preferences[..1], &orders[..1]).is_err());
        assert!(improved_borda_preferences(&preferences, &orders[..1]).is_err());
        assert!(matches!(
            improved_borda_preferences(&[vec![1.0, 2.0], vec![1.0]], &orders),
            Err(Error::RankingLengthMismatch { .. })
        ));
        assert!(matches!(
            improved_borda_preferences(&[vec![0.0, 0.0], vec![1.0, 2.0]], &orders),
            Err(Error::NumericInstability(_))
        ));
    }
}
