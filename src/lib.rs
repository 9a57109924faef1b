pub mod analysis;
pub mod budget;
pub mod compromise;
pub mod correlation;
mod error;
pub mod matrix;
pub mod methods;
pub mod num;
pub mod param;
pub mod perturbation;
pub mod ranking;
pub mod scenario;
pub mod weights;

pub use crate::compromise::CompromiseResult;
pub use crate::error::Error;
pub use crate::matrix::{Cell, CriterionType, DecisionMatrix};
pub use crate::num::Normalized;
pub use crate::param::{Direction, Interval, Param, Sign, Targets};
pub use crate::ranking::{PreferenceOrder, Ranking};
pub use crate::scenario::{Modification, Problem, Scenario, Variant};
pub use crate::weights::WeightVector;

/// An MCDA method that scores alternatives of a decision matrix.
///
/// Implementations receive matrices and weights exactly as the generators produce them. The
/// perturbation analyses and the ICRA compromise are generic over any implementation.
pub trait ScoringMethod: Sync {
    /// One preference value per alternative.
    fn preferences(
        &self,
        matrix: &DecisionMatrix,
        weights: &WeightVector,
        types: &[CriterionType],
    ) -> Result<Vec<f64>, Error>;

    fn order(&self) -> PreferenceOrder {
        PreferenceOrder::Descending
    }

    fn rank(
        &self,
        matrix: &DecisionMatrix,
        weights: &WeightVector,
        types: &[CriterionType],
    ) -> Result<Ranking, Error> {
        let preferences = self.preferences(matrix, weights, types)?;
        if preferences.len() != matrix.alternatives() {
            return Err(Error::Scoring(format!(
                "{} preferences for {} alternatives",
                preferences.len(),
                matrix.alternatives()
            )));
        }
        Ranking::from_preferences(&preferences, self.order())
    }
}

impl<M: ScoringMethod + ?Sized> ScoringMethod for &M {
    fn preferences(
        &self,
        matrix: &DecisionMatrix,
        weights: &WeightVector,
        types: &[CriterionType],
    ) -> Result<Vec<f64>, Error> {
        (**self).preferences(matrix, weights, types)
    }

    fn order(&self) -> PreferenceOrder {
        (**self).order()
    }
}
