use std::io::IsTerminal;
use owo_colors::OwoColorize;

use crate::analyzer::AnalyzerRegistry;
use crate::scoring::{ModelId, ScoreBreakdownEntry};
use crate::service::ScoreResponse;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with fixed precision ("0.7311", "-0.2500")
pub fn format_score(score: f64) -> String {
    format!("{:.4}", score)
}

/// Format a score response for the terminal.
///
/// First line is the aggregate score. When the response carries metadata,
/// one line per model follows with raw and scaled values:
/// "  {model}  raw {raw}  scaled {scaled}"
pub fn format_response(response: &ScoreResponse, use_colors: bool) -> String {
    let score = format_score(response.score);
    let mut lines = vec![if use_colors {
        format!("score {}", score.bold())
    } else {
        format!("score {}", score)
    }];

    if let Some(ref metadata) = response.metadata {
        let name_width = metadata
            .breakdown
            .keys()
            .map(|id| id.as_str().chars().count())
            .max()
            .unwrap_or(0);

        lines.extend(
            metadata
                .breakdown
                .iter()
                .map(|(id, entry)| format_breakdown_line(id, entry, name_width, use_colors)),
        );
    }

    lines.join("\n")
}

fn format_breakdown_line(
    id: &ModelId,
    entry: &ScoreBreakdownEntry,
    name_width: usize,
    use_colors: bool,
) -> String {
    let name = format!("{:<width$}", id.as_str(), width = name_width);
    let raw = format!("{:>7}", format_score(entry.raw));
    let scaled = format!("{:>7}", format_score(entry.scaled));

    if use_colors {
        format!("  {}  raw {}  scaled {}", name.cyan(), raw.dimmed(), scaled.bold())
    } else {
        format!("  {}  raw {}  scaled {}", name, raw, scaled)
    }
}

/// Format a score response as pretty-printed JSON for scripting
pub fn format_json(response: &ScoreResponse) -> serde_json::Result<String> {
    serde_json::to_string_pretty(response)
}

/// Format registered models, one per line, sorted by id.
/// Format: "{id}  {description}", default model marked with "*"
pub fn format_models(registry: &AnalyzerRegistry, default_model: &ModelId, use_colors: bool) -> String {
    if registry.is_empty() {
        return "No analyzers configured.".to_string();
    }

    let ids = registry.ids();
    let name_width = ids.iter().map(|id| id.as_str().chars().count()).max().unwrap_or(0);

    ids.into_iter()
        .map(|id| {
            let marker = if id == default_model { "*" } else { " " };
            let name = format!("{:<width$}", id.as_str(), width = name_width);
            let description = registry
                .get(id)
                .map(|analyzer| analyzer.describe())
                .unwrap_or_default();

            if use_colors {
                format!("{} {}  {}", marker.yellow(), name.bold(), description.dimmed())
            } else {
                format!("{} {}  {}", marker, name, description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
