//! Generators producing perturbed copies of a decision problem. Every generator leaves its input
//! untouched and returns new matrices or weight vectors.

pub mod discrete;
pub mod enumeration;
pub mod monte_carlo;
pub mod percentage;
pub mod range;
pub mod removal;

pub use discrete::{discrete_matrix, discrete_paired, DiscreteChange};
pub use enumeration::{weight_scenario_count, weight_scenarios, WeightScenarios};
pub use monte_carlo::{
    monte_carlo_matrix, monte_carlo_weights, perturbed_matrix, perturbed_weights,
    weight_sample_scenarios, CellDistribution, MonteCarloConfig, WeightDistribution,
};
pub use percentage::{percentage_matrix, percentage_weights, PercentageChange};
pub use range::{range_matrix, range_weights};
pub use removal::{remove_alternatives, remove_criteria};
