pub mod http;
pub mod registry;

#[cfg(test)]
pub mod testing;

pub use http::{build_client, HttpAnalyzer, ResponseShape};
pub use registry::AnalyzerRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Output of one analyzer invocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyzerResult {
    /// Expected in `[-1.0, 1.0]`; the engine rejects anything else.
    #[serde(alias = "score")]
    pub raw_score: f64,

    /// Free-form explanation, passed through to the report unmodified.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl AnalyzerResult {
    pub fn new(raw_score: f64, details: serde_json::Value) -> Self {
        Self { raw_score, details }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Backend(String),
}

/// A scoring backend: rates one dimension of a text on `[-1.0, 1.0]`.
///
/// Implementations must not depend on other analyzers' results; the engine
/// may run them concurrently.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        text: &str,
        config: &serde_json::Value,
    ) -> Result<AnalyzerResult, AnalysisError>;

    /// Short human-readable description of where results come from.
    fn describe(&self) -> String {
        "builtin".to_string()
    }
}
