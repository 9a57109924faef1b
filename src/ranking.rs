use std::cmp::Ordering;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{CriterionType, Error};

/// How a scoring method's preference values translate into a ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceOrder {
    /// Larger preference values rank higher.
    #[default]
    Descending,
    /// Smaller preference values rank higher.
    Ascending,
}

impl PreferenceOrder {
    /// Criterion type to use when preferences of this order are themselves treated as a criterion.
    pub fn criterion_type(self) -> CriterionType {
        match self {
            Self::Descending => CriterionType::Benefit,
            Self::Ascending => CriterionType::Cost,
        }
    }
}

/// Strict total order over alternatives `0..m`, best first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    order: Vec<usize>,
}

impl Ranking {
    /// `order[0]` is the best alternative.
    pub fn from_order(order: Vec<usize>) -> Result<Self, Error> {
        if order.is_empty() {
            return Err(Error::invalid("ranking must cover at least one alternative"));
        }
        let mut seen = vec![false; order.len()];
        for &alternative in &order {
            if alternative >= order.len() || seen[alternative] {
                return Err(Error::invalid(format!(
                    "ranking {order:?} is not a permutation of 0..{}",
                    order.len()
                )));
            }
            seen[alternative] = true;
        }
        Ok(Self { order })
    }

    /// `ranks[a]` is the 1-based rank of alternative `a`.
    pub fn from_ranks(ranks: &[usize]) -> Result<Self, Error> {
        let mut order = vec![usize::MAX; ranks.len()];
        for (alternative, &rank) in ranks.iter().enumerate() {
            if rank == 0 || rank > ranks.len() || order[rank - 1] != usize::MAX {
                return Err(Error::invalid(format!(
                    "ranks {ranks:?} are not a permutation of 1..={}",
                    ranks.len()
                )));
            }
            order[rank - 1] = alternative;
        }
        Self::from_order(order)
    }

    /// Rank alternatives by preference value. Equal values are ordered by ascending alternative
    /// index.
    pub fn from_preferences(preferences: &[f64], order: PreferenceOrder) -> Result<Self, Error> {
        let keys = preferences
            .iter()
            .map(|&p| {
                NotNan::new(p).map_err(|_| Error::NumericInstability("NaN preference".into()))
            })
            .collect::<Result<Vec<NotNan<f64>>, Error>>()?;
        Self::sorted_by(&keys, |a, b| match order {
            PreferenceOrder::Descending => b.cmp(a),
            PreferenceOrder::Ascending => a.cmp(b),
        })
    }

    /// Order alternatives by `compare` over their keys. The sort is stable, so ties keep ascending
    /// alternative index.
    pub(crate) fn sorted_by<T, F>(keys: &[T], compare: F) -> Result<Self, Error>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let indices: Vec<usize> = (0..keys.len()).collect();
        let sort = permutation::sort_by(keys, compare);
        Self::from_order(sort.apply_slice(&indices))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn best(&self) -> usize {
        self.order[0]
    }

    /// 0-based position of each alternative.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.order.len()];
        for (position, &alternative) in self.order.iter().enumerate() {
            positions[alternative] = position;
        }
        positions
    }

    /// 1-based rank of each alternative.
    pub fn ranks(&self) -> Vec<usize> {
        self.positions().into_iter().map(|p| p + 1).collect()
    }

    pub fn position(&self, alternative: usize) -> Option<usize> {
        self.order.iter().position(|&a| a == alternative)
    }
}
