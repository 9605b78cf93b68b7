use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use content_score::analyzer::AnalyzerRegistry;
use content_score::config::{self, Config};
use content_score::scoring::{Scorer, ScoringConfig};
use content_score::service::{ScoreRequest, ScoringService};

const EXIT_SUCCESS: i32 = 0;
const EXIT_SCORE: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_INPUT: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a text with the default model or a scoring config
    Score {
        /// Text to score (reads stdin when omitted)
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Scoring config (YAML or JSON) listing models, weights and activations
        #[arg(short, long)]
        scoring: Option<PathBuf>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a scoring config against the configured analyzers
    Validate {
        /// Scoring config (YAML or JSON)
        scoring: PathBuf,
    },
    /// List configured analyzers
    Models,
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "content-score")]
#[command(about = "Weighted content quality scoring over pluggable text analyzers", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/content-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    content_score::logging::init_tracing(cli.verbose);

    let config_path = cli.config.map(PathBuf::from);

    // init must work before any config exists
    if let Commands::Init { force } = cli.command {
        match config::init::write_starter_config(config_path, force) {
            Ok(path) => {
                println!("Wrote starter config to {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config::validate_config(&config) {
        print_errors("Config errors:", &errors);
        std::process::exit(EXIT_CONFIG);
    }

    tracing::debug!(analyzers = config.analyzers.len(), "loaded config");

    let registry = match AnalyzerRegistry::from_specs(&config.analyzers) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let use_colors = content_score::output::should_use_colors();

    match cli.command {
        Commands::Score {
            text,
            file,
            scoring,
            json,
        } => {
            let start_time = Instant::now();
            let service = match build_service(&config, registry) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Config error: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };

            let text = match read_text(text, file) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Input error: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };

            let scoring_config = match scoring {
                Some(path) => {
                    let scoring_config = load_scoring(&path);
                    if let Err(errors) =
                        content_score::scoring::validate_scoring(&scoring_config, service.scorer().registry())
                    {
                        print_errors("Scoring config errors:", &errors);
                        std::process::exit(EXIT_CONFIG);
                    }
                    Some(scoring_config)
                }
                None => None,
            };

            let response = match service
                .handle(ScoreRequest {
                    text,
                    config: scoring_config,
                })
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Scoring failed: {}", e);
                    std::process::exit(EXIT_SCORE);
                }
            };

            if json {
                match content_score::output::format_json(&response) {
                    Ok(output) => println!("{}", output),
                    Err(e) => {
                        eprintln!("Failed to serialize response: {}", e);
                        std::process::exit(EXIT_SCORE);
                    }
                }
            } else {
                println!("{}", content_score::output::format_response(&response, use_colors));
            }

            tracing::debug!(elapsed = ?start_time.elapsed(), "scoring finished");
        }
        Commands::Validate { scoring } => {
            let scoring_config = load_scoring(&scoring);
            match content_score::scoring::validate_scoring(&scoring_config, &registry) {
                Ok(()) => println!(
                    "{} is valid ({} models)",
                    scoring.display(),
                    scoring_config.models.len()
                ),
                Err(errors) => {
                    print_errors("Scoring config errors:", &errors);
                    std::process::exit(EXIT_CONFIG);
                }
            }
        }
        Commands::Models => {
            println!(
                "{}",
                content_score::output::format_models(&registry, &config.default_model(), use_colors)
            );
        }
        // handled before loading config
        Commands::Init { .. } => {}
    }

    std::process::exit(EXIT_SUCCESS);
}

fn build_service(config: &Config, registry: Arc<AnalyzerRegistry>) -> anyhow::Result<ScoringService> {
    let options = config::scorer_options(&config.engine)?;
    tracing::debug!(mode = ?options.mode, timeout = ?options.timeout, "engine options");
    Ok(ScoringService::new(Scorer::new(registry, options), config.default_model()))
}

/// Load a scoring config or exit with a config error.
fn load_scoring(path: &std::path::Path) -> ScoringConfig {
    match config::load_scoring_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

fn read_text(text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    use anyhow::Context;

    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("No text given. Pass TEXT, --file, or pipe text on stdin");
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("Failed to read text from stdin")?;
    Ok(buffer)
}

fn print_errors(header: &str, errors: &[String]) {
    eprintln!("{}", header);
    for error in errors {
        eprintln!("  - {}", error);
    }
}
