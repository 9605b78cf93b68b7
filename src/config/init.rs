use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{get_config_path, Config};

/// Starter configuration pointing at locally running analysis services.
const STARTER_CONFIG: &str = r#"# content-score configuration
#
# Model scored with weight 1.0 when a request carries no scoring config.
default_model: bias/openai/gpt-3.5-v1

engine:
  # sequential: one analyzer at a time, first failure in configured order wins
  # concurrent: all analyzers at once, first failure to complete wins
  mode: sequential
  timeout: 30s

analyzers:
  - id: bias/openai/gpt-3.5-v1
    endpoint: http://localhost:8000/analyze/bias
    response: score
    retries: 2
  - id: polarity/spacytextblob
    endpoint: http://localhost:5000/analyze
    response: textblob_polarity
  - id: objectivity/spacytextblob
    endpoint: http://localhost:5000/analyze
    response: textblob_objectivity
  - id: bias/d4data
    endpoint: http://localhost:5001/analyze
    response: labeled_bias
"#;

/// Write the starter config to `path` (or the default location).
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_starter_config(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let config_path = path.unwrap_or_else(get_config_path);

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite",
            config_path.display()
        );
    }

    ensure_parent_dir(&config_path)?;
    fs::write(&config_path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write config file at {}", config_path.display()))?;

    Ok(config_path)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }
    }
    Ok(())
}

/// The starter config, parsed. Useful as a reference when editing by hand.
pub fn starter_config() -> Result<Config> {
    serde_saphyr::from_str(STARTER_CONFIG).context("Starter config is not valid YAML")
}
