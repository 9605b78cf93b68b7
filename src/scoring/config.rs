use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one versioned analyzer implementation, e.g. `bias/openai/gpt-3.5-v1`.
///
/// Used both as the registry lookup key and as the key of the score breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Shape of the sigmoid that maps a raw score onto `[0, scaling]`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActivationParameters {
    /// Output range multiplier (default: 1.0)
    #[serde(default = "default_scaling")]
    pub scaling: f64,

    /// Slope of the transition (default: 5.0). Zero yields a flat `scaling / 2`.
    #[serde(default = "default_steepness")]
    pub steepness: f64,

    /// Raw score at which the output is exactly `scaling / 2` (default: 0.1)
    #[serde(default = "default_shift")]
    pub shift: f64,
}

fn default_scaling() -> f64 {
    1.0
}

fn default_steepness() -> f64 {
    5.0
}

fn default_shift() -> f64 {
    0.1
}

fn default_weight() -> f64 {
    1.0
}

impl Default for ActivationParameters {
    fn default() -> Self {
        Self {
            scaling: default_scaling(),
            steepness: default_steepness(),
            shift: default_shift(),
        }
    }
}

/// Per-analyzer settings: combination weight, activation and backend config.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelEntryConfig {
    /// Linear combination weight. Not bounded; negative weights invert a model's contribution.
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default)]
    pub activation: ActivationParameters,

    /// Backend-specific settings, passed to the analyzer untouched.
    #[serde(default, alias = "model", skip_serializing_if = "serde_json::Value::is_null")]
    pub analyzer_config: serde_json::Value,
}

impl Default for ModelEntryConfig {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            activation: ActivationParameters::default(),
            analyzer_config: serde_json::Value::Null,
        }
    }
}

/// One pipeline step: which analyzer to run and how to weigh it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub name: ModelId,

    #[serde(default)]
    pub config: ModelEntryConfig,
}

/// Ordered pipeline of analyzers for one request.
///
/// Example YAML:
/// ```yaml
/// models:
///   - name: bias/openai/gpt-3.5-v1
///     config:
///       weight: 0.7
///       activation: { scaling: 1.0, steepness: 5.0, shift: 0.1 }
///   - name: polarity/spacytextblob
///     config:
///       weight: 0.3
/// ```
///
/// The same id may appear more than once. Every occurrence is invoked and
/// contributes to the score, but the breakdown keeps only the last one.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ScoringConfig {
    /// Pipeline with a single model at weight 1.0 and default activation.
    pub fn single(name: impl Into<ModelId>) -> Self {
        Self {
            models: vec![ModelEntry {
                name: name.into(),
                config: ModelEntryConfig::default(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
