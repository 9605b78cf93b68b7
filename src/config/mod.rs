pub mod init;
mod schema;

pub use schema::{AnalyzerSpec, Config, EngineConfig, DEFAULT_MODEL};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scoring::{ScorerOptions, ScoringConfig};

/// Get the config directory path (~/.config/content-score/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("content-score"))
        .unwrap_or_else(|| PathBuf::from(".content-score"))
}

/// Get the default config file path (~/.config/content-score/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/content-score/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `content-score init` to create one",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Load a per-request scoring config from a YAML or JSON file.
pub fn load_scoring_config(path: &Path) -> Result<ScoringConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scoring config at {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scoring config: invalid JSON in {}", path.display()))?
    } else {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse scoring config: invalid YAML in {}", path.display()))?
    };

    Ok(config)
}

/// Parse the engine section into scorer options.
pub fn scorer_options(engine: &EngineConfig) -> Result<ScorerOptions> {
    let timeout = engine
        .timeout
        .as_deref()
        .map(parse_timeout)
        .transpose()?;

    Ok(ScorerOptions {
        mode: engine.mode,
        timeout,
    })
}

fn parse_timeout(s: &str) -> Result<Duration> {
    let timeout = humantime::parse_duration(s.trim())
        .with_context(|| format!("Invalid timeout '{}'", s))?;
    if timeout.is_zero() {
        anyhow::bail!("Timeout must be greater than zero");
    }
    Ok(timeout)
}

/// Validate the application config at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref timeout) = config.engine.timeout {
        if let Err(e) = parse_timeout(timeout) {
            errors.push(format!("engine.timeout: {:#}", e));
        }
    }

    let mut seen = HashSet::new();
    for (i, spec) in config.analyzers.iter().enumerate() {
        if !seen.insert(&spec.id) {
            errors.push(format!("analyzers[{}].id: duplicate id '{}'", i, spec.id));
        }
        if spec.endpoint.trim().is_empty() {
            errors.push(format!("analyzers[{}].endpoint: must not be empty", i));
        }
        if let Some(ref var) = spec.token_env {
            if crate::credentials::token_from_env(var).is_none() {
                errors.push(format!(
                    "analyzers[{}].token_env: environment variable {} is not set",
                    i, var
                ));
            }
        }
    }

    let default_model = config.default_model();
    if !config.analyzers.iter().any(|spec| spec.id == default_model) {
        errors.push(format!(
            "default_model: '{}' is not among the configured analyzers",
            default_model
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
