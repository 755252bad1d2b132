//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Enrich a scanner-produced code property graph: normalize its structure,
/// summarize every entity bottom-up through an LLM, and embed the
/// summaries for vector search.
#[derive(Debug, Parser)]
#[command(name = "codegraph-enrich", version)]
pub struct Cli {
    /// Root path of the scanned project (cache lives in `<path>/.cache`).
    pub project_path: PathBuf,

    /// Graph database HTTP endpoint.
    #[arg(long, env = "GRAPH_URI", default_value = "http://localhost:7474")]
    pub graph_uri: String,

    /// Graph database user.
    #[arg(long, env = "GRAPH_USER", default_value = "neo4j")]
    pub graph_user: String,

    /// Graph database password.
    #[arg(long, env = "GRAPH_PASSWORD", default_value = "neo4j", hide_env_values = true)]
    pub graph_password: String,

    /// Console log level.
    #[arg(long, value_enum, ignore_case = true, default_value = "info")]
    pub log_level: LogLevel,

    /// Also write logs (at any level) to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run the summarization and embedding passes after normalization.
    #[arg(long)]
    pub generate_summary: bool,

    /// Summarization backend.
    #[arg(long, value_enum, default_value = "ollama")]
    pub llm_api: LlmApi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for the tracing filter.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmApi {
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "deepseek")]
    DeepSeek,
    Ollama,
    Fake,
}

impl From<LlmApi> for ai_llm_service::LlmProvider {
    fn from(api: LlmApi) -> Self {
        match api {
            LlmApi::OpenAi => Self::OpenAi,
            LlmApi::DeepSeek => Self::DeepSeek,
            LlmApi::Ollama => Self::Ollama,
            LlmApi::Fake => Self::Fake,
        }
    }
}
