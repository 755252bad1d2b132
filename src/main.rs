mod cli;
mod logging;
mod orchestrator;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use ai_llm_service::{AiLlmError, EmbeddingService, LlmProvider, LlmService};
use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use graph_store::{GraphConfig, GraphError, GraphStore};
use summary_engine::{CacheOptions, DEFAULT_EMBEDDING_DIM, DEFAULT_WORKERS, SummaryCache};
use tracing::error;

use crate::cli::Cli;
use crate::orchestrator::{Orchestrator, RunReport};

const EXIT_CONFIG: u8 = 1;
const EXIT_GRAPH_UNAVAILABLE: u8 = 2;
const EXIT_FATAL: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    // A .env beside the binary is a convenience, not a requirement.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::from(EXIT_CONFIG);
    }

    match run(cli).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("enrichment run failed: {e:#}");
            ExitCode::from(classify_failure(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunReport> {
    let project_path = dunce::canonicalize(&cli.project_path)
        .with_context(|| config_error(&format!("invalid project path {:?}", cli.project_path)))?;
    if !project_path.is_dir() {
        bail!(config_error(&format!(
            "project path {} is not a directory",
            project_path.display()
        )));
    }
    let project_name = project_name_of(&project_path)?;

    let provider = LlmProvider::from(cli.llm_api);
    let llm = Arc::new(LlmService::from_env(provider)?);
    let embeddings = Arc::new(EmbeddingService::from_env(
        provider == LlmProvider::Fake,
        DEFAULT_EMBEDDING_DIM,
    )?);
    let cache = Arc::new(SummaryCache::new(&project_path, CacheOptions::default())?);

    let store = GraphStore::connect(GraphConfig::new(
        cli.graph_uri,
        cli.graph_user,
        cli.graph_password,
    ))
    .await?;

    let orchestrator = Orchestrator {
        store,
        cache,
        llm,
        embeddings,
        project_name,
        project_path: project_path.to_string_lossy().into_owned(),
        generate_summary: cli.generate_summary,
        workers: DEFAULT_WORKERS,
    };
    orchestrator.run().await
}

fn project_name_of(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| config_error(&format!("cannot derive project name from {}", path.display())))
}

fn config_error(message: &str) -> String {
    format!("configuration error: {message}")
}

fn print_report(report: &RunReport) {
    println!("{}", "enrichment complete".green().bold());
    if let Some(stats) = &report.summaries {
        println!(
            "  summaries: {} regenerated, {} restored, {} unchanged, {} skipped",
            stats.regenerated, stats.restored, stats.unchanged, stats.skipped
        );
        let embeddings_line = format!(
            "  embeddings: {} written, {} skipped",
            report.embedded, report.embedding_skipped
        );
        if report.embedding_skipped > 0 {
            println!("{}", embeddings_line.yellow());
        } else {
            println!("{embeddings_line}");
        }
        if stats.skipped > 0 {
            println!(
                "{}",
                format!("  {} items were skipped; see the log for details", stats.skipped).yellow()
            );
        }
    } else {
        println!("  normalization only (run with --generate-summary to summarize)");
    }
}

/// Maps a failed run onto the documented exit codes: configuration errors
/// exit 1, an unreachable graph exits 2, everything else 3.
fn classify_failure(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(graph_error) = cause.downcast_ref::<GraphError>() {
            return match graph_error {
                GraphError::Config(_) => EXIT_CONFIG,
                GraphError::Unavailable(_) => EXIT_GRAPH_UNAVAILABLE,
                _ => EXIT_FATAL,
            };
        }
        if let Some(llm_error) = cause.downcast_ref::<AiLlmError>() {
            return match llm_error {
                AiLlmError::MissingVar(_)
                | AiLlmError::InvalidEndpoint(_)
                | AiLlmError::UnsupportedProvider(_) => EXIT_CONFIG,
                _ => EXIT_FATAL,
            };
        }
        if cause.to_string().starts_with("configuration error:") {
            return EXIT_CONFIG;
        }
    }
    EXIT_FATAL
}
