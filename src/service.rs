use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scoring::{ModelId, ScoreBreakdownEntry, ScoreError, Scorer, ScoringConfig};

/// Inbound request: text plus an optional scoring config.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoreRequest {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ScoringConfig>,
}

/// Outbound response. `metadata` is only present when the request supplied
/// its own scoring config.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScoreResponse {
    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Metadata {
    pub config: ScoringConfig,
    pub breakdown: IndexMap<ModelId, ScoreBreakdownEntry>,
}

/// Resolves the optional request config and runs the engine.
#[derive(Debug, Clone)]
pub struct ScoringService {
    scorer: Scorer,
    default_config: ScoringConfig,
}

impl ScoringService {
    pub fn new(scorer: Scorer, default_model: ModelId) -> Self {
        Self {
            scorer,
            default_config: ScoringConfig::single(default_model),
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn default_config(&self) -> &ScoringConfig {
        &self.default_config
    }

    pub async fn handle(&self, request: ScoreRequest) -> Result<ScoreResponse, ScoreError> {
        let ScoreRequest { text, config } = request;

        match config {
            Some(config) => {
                let result = self.scorer.score(&text, &config).await?;
                tracing::info!(score = result.score, models = config.models.len(), "scored with request config");
                Ok(ScoreResponse {
                    score: result.score,
                    metadata: Some(Metadata {
                        config,
                        breakdown: result.breakdown,
                    }),
                })
            }
            None => {
                let result = self.scorer.score(&text, &self.default_config).await?;
                tracing::info!(score = result.score, "scored with default config");
                Ok(ScoreResponse {
                    score: result.score,
                    metadata: None,
                })
            }
        }
    }
}
