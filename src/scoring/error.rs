use thiserror::Error;

use super::config::ModelId;
use crate::analyzer::AnalysisError;

/// Reasons an aggregation is aborted. Any of these discards the partial result.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The configuration names a model that has no registered analyzer.
    #[error("unknown model '{0}'")]
    UnknownModel(ModelId),

    /// An analyzer returned a raw score outside `[-1.0, 1.0]`.
    #[error("model '{model}' returned score {value} outside [-1.0, 1.0]")]
    InvalidScore { model: ModelId, value: f64 },

    /// The analyzer itself failed.
    #[error("model '{model}' failed: {source}")]
    Analysis {
        model: ModelId,
        #[source]
        source: AnalysisError,
    },
}

impl ScoreError {
    /// Model the error is attributed to.
    pub fn model(&self) -> &ModelId {
        match self {
            ScoreError::UnknownModel(model)
            | ScoreError::InvalidScore { model, .. }
            | ScoreError::Analysis { model, .. } => model,
        }
    }
}
