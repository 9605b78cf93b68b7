pub mod activation;
pub mod config;
pub mod engine;
pub mod error;
pub mod validation;

pub use activation::activate;
pub use config::*;
pub use engine::{
    score, AggregateResult, ExecutionMode, ScoreBreakdownEntry, Scorer, ScorerOptions,
};
pub use error::ScoreError;
pub use validation::validate_scoring;
