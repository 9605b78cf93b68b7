use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::{AnalysisError, Analyzer, AnalyzerResult};
use crate::config::AnalyzerSpec;

/// How the JSON body returned by an analysis service maps onto a raw score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `{"score": f64, "details": any}`
    #[default]
    Score,
    /// spaCy/TextBlob body; the score is `polarity`.
    TextblobPolarity,
    /// spaCy/TextBlob body; `subjectivity` in `[0, 1]` flipped into objectivity on `[-1, 1]`.
    TextblobObjectivity,
    /// Classifier body `{"label": "Biased" | "Non-biased", "score": f64}`.
    LabeledBias,
}

impl ResponseShape {
    /// Extract the raw score from a response body. Details are the body itself
    /// unless the service returns its own `details` field.
    pub fn extract(&self, body: Value) -> Result<AnalyzerResult, AnalysisError> {
        match self {
            ResponseShape::Score => {
                let score = number_field(&body, "score")?;
                let details = body.get("details").cloned().unwrap_or(Value::Null);
                Ok(AnalyzerResult::new(score, details))
            }
            ResponseShape::TextblobPolarity => {
                let polarity = number_field(&body, "polarity")?;
                Ok(AnalyzerResult::new(polarity, body))
            }
            ResponseShape::TextblobObjectivity => {
                let subjectivity = number_field(&body, "subjectivity")?;
                let objectivity = 1.0 - subjectivity;
                Ok(AnalyzerResult::new((objectivity - 0.5) * 2.0, body))
            }
            ResponseShape::LabeledBias => {
                // Text classification pipelines answer with a one-element list
                let prediction = match &body {
                    Value::Array(items) => items.first().cloned().ok_or_else(|| {
                        AnalysisError::MalformedResponse("empty prediction list".to_string())
                    })?,
                    _ => body.clone(),
                };
                let score = number_field(&prediction, "score")?;
                let label = prediction
                    .get("label")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AnalysisError::MalformedResponse("missing string field 'label'".to_string())
                    })?;
                let signed = if label.eq_ignore_ascii_case("biased") {
                    -score
                } else {
                    score
                };
                Ok(AnalyzerResult::new(signed, prediction))
            }
        }
    }
}

/// Build the HTTP client shared by all analyzers.
pub fn build_client() -> Result<reqwest::Client> {
    // rustls 0.23+ needs a process-level crypto provider; ignore "already installed"
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder()
        .user_agent(concat!("content-score/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

fn number_field(body: &Value, field: &str) -> Result<f64, AnalysisError> {
    body.get(field).and_then(Value::as_f64).ok_or_else(|| {
        AnalysisError::MalformedResponse(format!("missing numeric field '{}'", field))
    })
}

/// Analyzer backed by an HTTP analysis service.
///
/// Posts `{"text": ..., "config": ...}` to `endpoint`. Transport failures and
/// 5xx responses are retried with exponential backoff; 4xx responses are not.
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    shape: ResponseShape,
    bearer_token: Option<String>,
    retries: usize,
}

impl HttpAnalyzer {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            shape,
            bearer_token: None,
            retries: 0,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn from_spec(client: reqwest::Client, spec: &AnalyzerSpec) -> Result<Self> {
        let mut analyzer =
            Self::new(client, spec.endpoint.clone(), spec.response).with_retries(spec.retries);
        if let Some(ref var) = spec.token_env {
            let token = crate::credentials::token_from_env(var)
                .ok_or_else(|| anyhow!("Environment variable {} is not set", var))?;
            analyzer = analyzer.with_bearer_token(token);
        }
        Ok(analyzer)
    }

    async fn post_once(&self, text: &str, config: &Value) -> Result<Value, AnalysisError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text, "config": config }));
        if let Some(ref token) = self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Http { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
    }
}

fn is_transient(error: &AnalysisError) -> bool {
    match error {
        AnalysisError::Request(e) => e.is_timeout() || e.is_connect(),
        AnalysisError::Http { status, .. } => status.is_server_error(),
        _ => false,
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    async fn analyze(&self, text: &str, config: &Value) -> Result<AnalyzerResult, AnalysisError> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retries);

        let body = RetryIf::spawn(
            retry_strategy,
            || self.post_once(text, config),
            |e: &AnalysisError| {
                let transient = is_transient(e);
                if transient {
                    tracing::warn!(endpoint = %self.endpoint, error = %e, "transient analysis failure");
                }
                transient
            },
        )
        .await?;

        self.shape.extract(body)
    }

    fn describe(&self) -> String {
        format!("{} ({:?})", self.endpoint, self.shape)
    }
}
