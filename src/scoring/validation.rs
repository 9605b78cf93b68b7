use super::config::ScoringConfig;
use crate::analyzer::AnalyzerRegistry;

/// Pre-flight check of a scoring config against the registered analyzers.
/// Returns all validation errors at once (not just the first).
///
/// Weights and activation parameters are only required to be finite; negative
/// weights and zero steepness are legal.
pub fn validate_scoring(config: &ScoringConfig, registry: &AnalyzerRegistry) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (i, model) in config.models.iter().enumerate() {
        if !registry.contains(&model.name) {
            errors.push(format!("models[{}].name: unknown model '{}'", i, model.name));
        }

        let entry = &model.config;
        let activation = &entry.activation;
        for (field, value) in [
            ("weight", entry.weight),
            ("activation.scaling", activation.scaling),
            ("activation.steepness", activation.steepness),
            ("activation.shift", activation.shift),
        ] {
            if !value.is_finite() {
                errors.push(format!("models[{}].config.{}: must be finite, got {}", i, field, value));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
