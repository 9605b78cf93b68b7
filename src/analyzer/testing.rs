//! Analyzer doubles for engine and service tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{AnalysisError, Analyzer, AnalyzerResult};

/// Always returns the same score, with `details` echoing the analyzer config.
pub struct FixedAnalyzer {
    score: f64,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FixedAnalyzer {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delayed(score: f64, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(score)
        }
    }

    /// Shared counter of completed `analyze` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Analyzer for FixedAnalyzer {
    async fn analyze(&self, _text: &str, config: &Value) -> Result<AnalyzerResult, AnalysisError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AnalyzerResult::new(self.score, config.clone()))
    }
}

/// Scores texts by length so results depend on the input.
pub struct LengthAnalyzer;

#[async_trait]
impl Analyzer for LengthAnalyzer {
    async fn analyze(&self, text: &str, _config: &Value) -> Result<AnalyzerResult, AnalysisError> {
        let score = (text.len() as f64 / 100.0).min(1.0);
        Ok(AnalyzerResult::new(score, Value::from(text.len())))
    }
}

/// Fails with a backend error, optionally after a delay.
pub struct FailingAnalyzer {
    message: String,
    delay: Option<Duration>,
}

impl FailingAnalyzer {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            delay: None,
        }
    }

    pub fn delayed(message: &str, delay: Duration) -> Self {
        Self {
            message: message.to_string(),
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl Analyzer for FailingAnalyzer {
    async fn analyze(&self, _text: &str, _config: &Value) -> Result<AnalyzerResult, AnalysisError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(AnalysisError::Backend(self.message.clone()))
    }
}

/// Sets a flag once its (slow) analysis finishes. Used to observe cancellation.
pub struct SlowFlagAnalyzer {
    delay: Duration,
    finished: Arc<AtomicBool>,
}

impl SlowFlagAnalyzer {
    pub fn new(delay: Duration) -> (Self, Arc<AtomicBool>) {
        let finished = Arc::new(AtomicBool::new(false));
        (
            Self {
                delay,
                finished: finished.clone(),
            },
            finished,
        )
    }
}

#[async_trait]
impl Analyzer for SlowFlagAnalyzer {
    async fn analyze(&self, _text: &str, _config: &Value) -> Result<AnalyzerResult, AnalysisError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(AnalyzerResult::new(0.0, Value::Null))
    }
}
