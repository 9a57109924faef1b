//! Aggregation of several rankings over the same alternatives into one consensus ranking.

pub mod borda;
pub mod dominance;
pub mod hq;
pub mod icra;
pub mod improved_borda;
pub mod rank_position;

use serde::Serialize;

use crate::{Error, PreferenceOrder, Ranking};

pub use borda::borda;
pub use dominance::{dominance_directed_graph, DominanceConfig, DominanceResult};
pub use hq::{hq_compromise, HqConfig, HqResult};
pub use icra::{icra, IcraConfig, IcraResult, IcraRound, IcraStop};
pub use improved_borda::{improved_borda, improved_borda_preferences};
pub use rank_position::rank_position;

/// A consensus ranking and the per-alternative values it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompromiseResult {
    pub ranking: Ranking,
    pub scores: Vec<f64>,
}

impl CompromiseResult {
    pub(crate) fn from_scores(scores: Vec<f64>, order: PreferenceOrder) -> Result<Self, Error> {
        let ranking = Ranking::from_preferences(&scores, order)?;
        Ok(Self { ranking, scores })
    }
}

/// Number of alternatives shared by all rankings.
pub(crate) fn check_rankings(rankings: &[Ranking]) -> Result<usize, Error> {
    if rankings.len() < 2 {
        return Err(Error::InsufficientRankings(rankings.len()));
    }
    let expected = rankings[0].len();
    match rankings.iter().position(|r| r.len() != expected) {
        None => Ok(expected),
        Some(index) => Err(Error::RankingLengthMismatch {
            index,
            expected,
            found: rankings[index].len(),
        }),
    }
}
