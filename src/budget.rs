//! Pre-flight size checks for generators whose output grows combinatorially.

use serde::{Deserialize, Serialize};

use crate::{perturbation::enumeration::weight_scenario_count, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_items: u128,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_items: 1_000_000,
        }
    }
}

impl Budget {
    pub fn check(&self, required: u128) -> Result<(), Error> {
        if required > self.max_items {
            return Err(Error::ResourceLimit {
                required,
                limit: self.max_items,
            });
        }
        Ok(())
    }

    pub fn check_weight_scenarios(&self, criteria: usize, step: f64) -> Result<(), Error> {
        let count = weight_scenario_count(criteria, step)?;
        // An overflowing count is certainly above any budget.
        self.check(count.unwrap_or(u128::MAX))
    }

    /// `cells` values drawn for each of `samples` samples.
    pub fn check_samples(&self, samples: usize, cells: usize) -> Result<(), Error> {
        self.check((samples as u128).saturating_mul(cells as u128))
    }
}
