use serde::{Deserialize, Serialize};

use crate::analyzer::ResponseShape;
use crate::scoring::{ExecutionMode, ModelId};

/// Model used when a request carries no scoring config and the file names none.
pub const DEFAULT_MODEL: &str = "bias/openai/gpt-3.5-v1";

fn default_retries() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Model scored with weight 1.0 when a request has no scoring config
    #[serde(default)]
    pub default_model: Option<ModelId>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub analyzers: Vec<AnalyzerSpec>,
}

impl Config {
    pub fn default_model(&self) -> ModelId {
        self.default_model
            .clone()
            .unwrap_or_else(|| ModelId::from(DEFAULT_MODEL))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Per-analyzer timeout, e.g. "30s" or "1m 30s"
    #[serde(default)]
    pub timeout: Option<String>,
}

/// One analysis service registered under a model id.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerSpec {
    pub id: ModelId,
    pub endpoint: String,

    #[serde(default)]
    pub response: ResponseShape,

    /// Environment variable holding a bearer token for the endpoint
    #[serde(default)]
    pub token_env: Option<String>,

    /// Retries on transport errors and 5xx responses
    #[serde(default = "default_retries")]
    pub retries: usize,
}
