//! Analyses built on scoring perturbed scenarios.

pub mod acceptability;
pub mod evaluate;
pub mod promotion;
pub mod relevance;

pub use acceptability::{rank_acceptability, Acceptability};
pub use evaluate::{evaluate, evaluate_samples, Evaluation, EvaluationConfig};
pub use promotion::{ranking_promotion, Promotion, PromotionConfig};
pub use relevance::{criteria_relevance, CriterionRemoval, RelevanceRound};
