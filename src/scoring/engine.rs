use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::activation::activate;
use super::config::{ModelEntry, ModelId, ScoringConfig};
use super::error::ScoreError;
use crate::analyzer::{AnalysisError, Analyzer, AnalyzerRegistry, AnalyzerResult};

/// Per-model row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdownEntry {
    pub raw: f64,
    pub scaled: f64,
    pub details: serde_json::Value,
}

/// Weighted sum of all scaled scores plus the per-model breakdown.
///
/// The breakdown keeps the configured order. A model configured twice shows
/// only its last invocation, although both invocations count towards `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub score: f64,
    pub breakdown: IndexMap<ModelId, ScoreBreakdownEntry>,
}

/// How analyzer invocations of one aggregation are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One analyzer at a time, in configured order. The first failure in
    /// configured order is reported.
    #[default]
    Sequential,
    /// All analyzers at once. The first failure to complete is reported and
    /// the remaining in-flight analyses are dropped.
    Concurrent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScorerOptions {
    pub mode: ExecutionMode,
    /// Upper bound for a single analyzer call.
    pub timeout: Option<Duration>,
}

/// Aggregation engine bound to a process-wide analyzer registry.
#[derive(Debug, Clone)]
pub struct Scorer {
    registry: Arc<AnalyzerRegistry>,
    options: ScorerOptions,
}

impl Scorer {
    pub fn new(registry: Arc<AnalyzerRegistry>, options: ScorerOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    pub fn options(&self) -> ScorerOptions {
        self.options
    }

    /// Score `text` with every analyzer in `config` and combine the results.
    ///
    /// All-or-nothing: an unknown model, an out-of-range raw score or an
    /// analyzer failure aborts the whole call. No partial result is returned.
    pub async fn score(&self, text: &str, config: &ScoringConfig) -> Result<AggregateResult, ScoreError> {
        // Resolve everything up front so an unknown id costs no backend calls
        let plan = config
            .models
            .iter()
            .map(|entry| {
                self.registry
                    .get(&entry.name)
                    .map(|analyzer| (entry, analyzer))
                    .ok_or_else(|| ScoreError::UnknownModel(entry.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let results = match self.options.mode {
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(plan.len());
                for (entry, analyzer) in &plan {
                    results.push(self.invoke(text, entry, analyzer.as_ref()).await?);
                }
                results
            }
            ExecutionMode::Concurrent => {
                try_join_all(
                    plan.iter()
                        .map(|(entry, analyzer)| self.invoke(text, entry, analyzer.as_ref())),
                )
                .await?
            }
        };

        let mut total = 0.0;
        let mut breakdown = IndexMap::with_capacity(plan.len());
        for ((entry, _), result) in plan.iter().zip(results) {
            let params = &entry.config.activation;
            let scaled = activate(result.raw_score, params);
            total += entry.config.weight * scaled;

            tracing::debug!(
                model = %entry.name,
                raw = result.raw_score,
                scaled,
                weight = entry.config.weight,
                "model scored"
            );

            breakdown.insert(
                entry.name.clone(),
                ScoreBreakdownEntry {
                    raw: result.raw_score,
                    scaled,
                    details: result.details,
                },
            );
        }

        Ok(AggregateResult {
            score: total,
            breakdown,
        })
    }

    /// Run one analyzer and check its raw score lies in `[-1.0, 1.0]`.
    async fn invoke(
        &self,
        text: &str,
        entry: &ModelEntry,
        analyzer: &dyn Analyzer,
    ) -> Result<AnalyzerResult, ScoreError> {
        let call = analyzer.analyze(text, &entry.config.analyzer_config);
        let outcome = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AnalysisError::Timeout(limit)),
            },
            None => call.await,
        };

        let result = outcome.map_err(|source| ScoreError::Analysis {
            model: entry.name.clone(),
            source,
        })?;

        if !(-1.0..=1.0).contains(&result.raw_score) {
            return Err(ScoreError::InvalidScore {
                model: entry.name.clone(),
                value: result.raw_score,
            });
        }

        Ok(result)
    }
}

/// Sequential aggregation without a timeout.
pub async fn score(
    text: &str,
    config: &ScoringConfig,
    registry: Arc<AnalyzerRegistry>,
) -> Result<AggregateResult, ScoreError> {
    Scorer::new(registry, ScorerOptions::default())
        .score(text, config)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::testing::{
        FailingAnalyzer, FixedAnalyzer, LengthAnalyzer, SlowFlagAnalyzer,
    };
    use crate::scoring::{ActivationParameters, ModelEntryConfig};
    use std::sync::atomic::Ordering;

    fn entry(name: &str, weight: f64) -> ModelEntry {
        ModelEntry {
            name: ModelId::from(name),
            config: ModelEntryConfig {
                weight,
                ..ModelEntryConfig::default()
            },
        }
    }

    fn config(models: Vec<ModelEntry>) -> ScoringConfig {
        ScoringConfig { models }
    }

    fn fixed_registry(models: &[(&str, f64)]) -> Arc<AnalyzerRegistry> {
        let mut registry = AnalyzerRegistry::new();
        for (id, score) in models {
            registry.register(*id, FixedAnalyzer::new(*score));
        }
        Arc::new(registry)
    }

    fn scorer(registry: Arc<AnalyzerRegistry>, mode: ExecutionMode) -> Scorer {
        Scorer::new(
            registry,
            ScorerOptions {
                mode,
                timeout: None,
            },
        )
    }

    #[tokio::test]
    async fn test_empty_config_scores_zero() {
        let registry = fixed_registry(&[("bias/a", 1.0)]);
        let result = score("text", &ScoringConfig::default(), registry).await.unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.breakdown.is_empty());
    }

    #[tokio::test]
    async fn test_single_model_default_activation() {
        let registry = fixed_registry(&[("bias/a", 1.0)]);
        let result = score("text", &config(vec![entry("bias/a", 1.0)]), registry)
            .await
            .unwrap();

        let expected = activate(1.0, &ActivationParameters::default());
        assert_eq!(result.score, expected);
        assert_eq!(result.breakdown.len(), 1);

        let row = &result.breakdown[&ModelId::from("bias/a")];
        assert_eq!(row.raw, 1.0);
        assert_eq!(row.scaled, expected);
    }

    #[tokio::test]
    async fn test_linear_combination_is_exact() {
        let registry = fixed_registry(&[("bias/a", 1.0), ("polarity/b", -1.0)]);
        let result = score(
            "text",
            &config(vec![entry("bias/a", 0.5), entry("polarity/b", 0.5)]),
            registry,
        )
        .await
        .unwrap();

        let params = ActivationParameters::default();
        let expected = 0.5 * activate(1.0, &params) + 0.5 * activate(-1.0, &params);
        assert_eq!(result.score, expected);
    }

    #[tokio::test]
    async fn test_weights_are_not_normalized() {
        let registry = fixed_registry(&[("bias/a", 0.1)]);
        let result = score("text", &config(vec![entry("bias/a", 4.0)]), registry)
            .await
            .unwrap();
        // activate(shift) = 0.5, times an unnormalized weight of 4
        assert_eq!(result.score, 2.0);
    }

    #[tokio::test]
    async fn test_negative_weight_inverts_contribution() {
        let registry = fixed_registry(&[("bias/a", 0.1)]);
        let result = score("text", &config(vec![entry("bias/a", -1.0)]), registry)
            .await
            .unwrap();
        assert_eq!(result.score, -0.5);
    }

    #[tokio::test]
    async fn test_custom_activation_per_entry() {
        let registry = fixed_registry(&[("bias/a", 0.0)]);
        let mut model = entry("bias/a", 1.0);
        model.config.activation = ActivationParameters {
            scaling: 10.0,
            steepness: 0.0,
            shift: 0.7,
        };
        let result = score("text", &config(vec![model]), registry).await.unwrap();
        assert_eq!(result.score, 5.0);
    }

    #[tokio::test]
    async fn test_unknown_model_fails() {
        let registry = fixed_registry(&[("bias/a", 1.0)]);
        let err = score(
            "text",
            &config(vec![entry("bias/a", 1.0), entry("bias/missing", 1.0)]),
            registry,
        )
        .await
        .unwrap_err();

        match err {
            ScoreError::UnknownModel(id) => assert_eq!(id.as_str(), "bias/missing"),
            other => panic!("expected UnknownModel, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_model_skips_backend_calls() {
        let analyzer = FixedAnalyzer::new(0.5);
        let calls = analyzer.calls();
        let mut registry = AnalyzerRegistry::new();
        registry.register("bias/a", analyzer);

        let result = score(
            "text",
            &config(vec![entry("bias/a", 1.0), entry("bias/missing", 1.0)]),
            Arc::new(registry),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_score_fails() {
        let registry = fixed_registry(&[("bias/a", 0.2), ("bias/broken", 1.5)]);
        let err = score(
            "text",
            &config(vec![entry("bias/a", 1.0), entry("bias/broken", 1.0)]),
            registry,
        )
        .await
        .unwrap_err();

        match err {
            ScoreError::InvalidScore { model, value } => {
                assert_eq!(model.as_str(), "bias/broken");
                assert_eq!(value, 1.5);
            }
            other => panic!("expected InvalidScore, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_range_bounds_are_inclusive() {
        let registry = fixed_registry(&[("low", -1.0), ("high", 1.0)]);
        let result = score(
            "text",
            &config(vec![entry("low", 1.0), entry("high", 1.0)]),
            registry,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_nan_score_fails() {
        let registry = fixed_registry(&[("bias/nan", f64::NAN)]);
        let err = score("text", &config(vec![entry("bias/nan", 1.0)]), registry)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidScore { .. }));
    }

    #[tokio::test]
    async fn test_analysis_error_propagates() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register("bias/a", FixedAnalyzer::new(0.5))
            .register("bias/down", FailingAnalyzer::new("upstream timeout"));
        let err = score(
            "text",
            &config(vec![entry("bias/a", 1.0), entry("bias/down", 1.0)]),
            Arc::new(registry),
        )
        .await
        .unwrap_err();

        match err {
            ScoreError::Analysis { model, source } => {
                assert_eq!(model.as_str(), "bias/down");
                assert_eq!(source.to_string(), "upstream timeout");
            }
            other => panic!("expected Analysis, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_model_last_write_wins() {
        let registry = fixed_registry(&[("bias/a", 1.0), ("polarity/b", 0.1)]);
        let mut first = entry("bias/a", 1.0);
        first.config.analyzer_config = serde_json::json!({ "run": 1 });
        let mut second = entry("bias/a", 0.25);
        second.config.analyzer_config = serde_json::json!({ "run": 2 });
        second.config.activation.scaling = 2.0;
        let second_params = second.config.activation;

        let result = score(
            "text",
            &config(vec![first, entry("polarity/b", 1.0), second]),
            registry,
        )
        .await
        .unwrap();

        let default_scaled = activate(1.0, &ActivationParameters::default());
        let second_scaled = activate(1.0, &second_params);
        // Both invocations count, plus 0.5 from polarity/b at its shift point
        assert_eq!(result.score, default_scaled + 0.5 + 0.25 * second_scaled);

        assert_eq!(result.breakdown.len(), 2);
        let row = &result.breakdown[&ModelId::from("bias/a")];
        assert_eq!(row.scaled, second_scaled);
        assert_eq!(row.details, serde_json::json!({ "run": 2 }));

        // Overwriting keeps the position of the first occurrence
        let keys: Vec<&str> = result.breakdown.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["bias/a", "polarity/b"]);
    }

    #[tokio::test]
    async fn test_breakdown_follows_config_order() {
        let registry = fixed_registry(&[("z", 0.0), ("a", 0.0), ("m", 0.0)]);
        let result = score(
            "text",
            &config(vec![entry("z", 1.0), entry("a", 1.0), entry("m", 1.0)]),
            registry,
        )
        .await
        .unwrap();

        let keys: Vec<&str> = result.breakdown.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_analyzer_config_passed_through() {
        let registry = fixed_registry(&[("bias/a", 0.3)]);
        let mut model = entry("bias/a", 1.0);
        model.config.analyzer_config = serde_json::json!({ "temperature": 0, "model": "gpt-3.5-turbo" });

        let result = score("text", &config(vec![model]), registry).await.unwrap();
        assert_eq!(
            result.breakdown[&ModelId::from("bias/a")].details,
            serde_json::json!({ "temperature": 0, "model": "gpt-3.5-turbo" })
        );
    }

    #[tokio::test]
    async fn test_scoring_is_idempotent() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register("length", LengthAnalyzer)
            .register("bias/a", FixedAnalyzer::new(-0.3));
        let scorer = scorer(Arc::new(registry), ExecutionMode::Sequential);
        let cfg = config(vec![entry("length", 0.7), entry("bias/a", 0.3)]);

        let first = scorer.score("some text to rate", &cfg).await.unwrap();
        let second = scorer.score("some text to rate", &cfg).await.unwrap();
        assert_eq!(first.score.to_bits(), second.score.to_bits());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register("slow", FixedAnalyzer::delayed(0.9, Duration::from_millis(50)))
            .register("fast", FixedAnalyzer::new(-0.4))
            .register("length", LengthAnalyzer);
        let registry = Arc::new(registry);
        let cfg = config(vec![entry("slow", 0.2), entry("fast", 0.5), entry("length", 0.3)]);

        let sequential = scorer(registry.clone(), ExecutionMode::Sequential)
            .score("text", &cfg)
            .await
            .unwrap();
        let concurrent = scorer(registry, ExecutionMode::Concurrent)
            .score("text", &cfg)
            .await
            .unwrap();

        assert_eq!(sequential.score.to_bits(), concurrent.score.to_bits());
        let keys: Vec<&str> = concurrent.breakdown.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["slow", "fast", "length"]);
    }

    #[tokio::test]
    async fn test_sequential_reports_first_failure_by_config_order() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register("late", FailingAnalyzer::delayed("late failure", Duration::from_millis(100)))
            .register("early", FailingAnalyzer::new("early failure"));
        let cfg = config(vec![entry("late", 1.0), entry("early", 1.0)]);

        let err = scorer(Arc::new(registry), ExecutionMode::Sequential)
            .score("text", &cfg)
            .await
            .unwrap_err();
        assert_eq!(err.model().as_str(), "late");
    }

    #[tokio::test]
    async fn test_concurrent_reports_first_failure_by_completion() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register("late", FailingAnalyzer::delayed("late failure", Duration::from_millis(100)))
            .register("early", FailingAnalyzer::new("early failure"));
        let cfg = config(vec![entry("late", 1.0), entry("early", 1.0)]);

        let err = scorer(Arc::new(registry), ExecutionMode::Concurrent)
            .score("text", &cfg)
            .await
            .unwrap_err();
        assert_eq!(err.model().as_str(), "early");
    }

    #[tokio::test]
    async fn test_concurrent_failure_cancels_siblings() {
        let (slow, finished) = SlowFlagAnalyzer::new(Duration::from_millis(100));
        let mut registry = AnalyzerRegistry::new();
        registry
            .register("slow", slow)
            .register("broken", FailingAnalyzer::new("malformed backend response"));
        let cfg = config(vec![entry("slow", 1.0), entry("broken", 1.0)]);

        let result = scorer(Arc::new(registry), ExecutionMode::Concurrent)
            .score("text", &cfg)
            .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_analysis_error() {
        let mut registry = AnalyzerRegistry::new();
        registry.register("slow", FixedAnalyzer::delayed(0.5, Duration::from_millis(500)));
        let scorer = Scorer::new(
            Arc::new(registry),
            ScorerOptions {
                mode: ExecutionMode::Sequential,
                timeout: Some(Duration::from_millis(20)),
            },
        );

        let err = scorer
            .score("text", &config(vec![entry("slow", 1.0)]))
            .await
            .unwrap_err();
        match err {
            ScoreError::Analysis { model, source } => {
                assert_eq!(model.as_str(), "slow");
                assert!(matches!(source, AnalysisError::Timeout(_)));
            }
            other => panic!("expected Analysis timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_not_hit() {
        let mut registry = AnalyzerRegistry::new();
        registry.register("quick", FixedAnalyzer::new(0.5));
        let scorer = Scorer::new(
            Arc::new(registry),
            ScorerOptions {
                mode: ExecutionMode::Concurrent,
                timeout: Some(Duration::from_secs(5)),
            },
        );

        let result = scorer.score("text", &config(vec![entry("quick", 1.0)])).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_execution_mode_parse() {
        let mode: ExecutionMode = serde_saphyr::from_str("concurrent").unwrap();
        assert_eq!(mode, ExecutionMode::Concurrent);
        assert_eq!(ExecutionMode::default(), ExecutionMode::Sequential);
    }
}
