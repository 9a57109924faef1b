use crate::{
    compromise::{check_rankings, CompromiseResult},
    Error, PreferenceOrder, Ranking,
};

/// Each ranking awards `m - position` points. Equal totals are ordered by alternative index.
pub fn borda(rankings: &[Ranking]) -> Result<CompromiseResult, Error> {
    check_rankings(rankings)?;
    CompromiseResult::from_scores(points(rankings, |_| 1.0), PreferenceOrder::Descending)
}

/// Borda points with the contribution of ranking `k` scaled by `weight(k)`.
pub(crate) fn points(rankings: &[Ranking], weight: impl Fn(usize) -> f64) -> Vec<f64> {
    let m = rankings[0].len();
    let mut scores = vec![0.0; m];
    for (k, ranking) in rankings.iter().enumerate() {
        let weight = weight(k);
        for (position, &alternative) in ranking.order().iter().enumerate() {
            scores[alternative] += weight * (m - position) as f64;
        }
    }
    scores
}

#[cfg(test)]
mod test {
    use super::*;

    fn ranking(order: &[usize]) -> Ranking {
        Ranking::from_order(order.to_vec()).unwrap()
    }

    #[test]
    fn identical_rankings_unchanged() {
        let r = ranking(&[1, 2, 0]);
        let result = borda(&[r.clone(), r.clone()]).unwrap();
        assert_eq!(result.ranking, r);
        assert_eq!(result.scores, vec![2.0, 6.0, 4.0]);
    }

    #[test]
    fn symmetric_tie_uses_index() {
        let result = borda(&[ranking(&[0, 1, 2]), ranking(&[2, 1, 0])]).unwrap();
        assert_eq!(result.scores, vec![4.0, 4.0, 4.0]);
        assert_eq!(result.ranking.order(), &[0, 1, 2]);
    }

    #[test]
    fn majority_order() {
        let rankings = [
            Ranking::from_ranks(&[3, 4, 2, 1]).unwrap(),
            Ranking::from_ranks(&[2, 4, 3, 1]).unwrap(),
            Ranking::from_ranks(&[3, 4, 2, 1]).unwrap(),
        ];
        let result = borda(&rankings).unwrap();
        assert_eq!(result.ranking.ranks(), vec![3, 4, 2, 1]);
    }

    #[test]
    fn input_contract() {
        assert_eq!(
            borda(&[ranking(&[0, 1])]),
            Err(Error::InsufficientRankings(1))
        );
        assert!(matches!(
            borda(&[ranking(&[0, 1]), ranking(&[0, 1, 2])]),
            Err(Error::RankingLengthMismatch { index: 1, .. })
        ));
    }
}
