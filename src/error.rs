use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid range [{low}, {high}]")]
    InvalidRange { low: f64, high: f64 },
    #[error("no valid sample after {attempts} attempts")]
    GenerationExhausted { attempts: usize },
    #[error("at least 2 rankings are required, got {0}")]
    InsufficientRankings(usize),
    #[error("ranking {index} covers {found} alternatives, expected {expected}")]
    RankingLengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("numeric instability: {0}")]
    NumericInstability(String),
    #[error("operation requires {required} items, limit is {limit}")]
    ResourceLimit { required: u128, limit: u128 },
    #[error("scoring method failed: {0}")]
    Scoring(String),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}
