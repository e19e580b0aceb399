/*
newsbrief - main.rs
Command-line entry point: one-shot queries, the interactive terminal session, and the HTTP API.
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::Config;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::llm::gemini::GeminiProvider;
use newsbrief::llm::LlmProvider;
use newsbrief::pipeline::NewsPipeline;
use newsbrief::server::launch_rocket;
use newsbrief::terminal::{run_shell, search_and_show, Console, Typing, ViewMode};
use newsbrief::topics::{strip_emoji, PRESET_TOPICS};

#[derive(Parser, Debug)]
#[command(name = "newsbrief", about = "Grounded Taiwanese news summaries from the terminal or over HTTP")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Search news about a topic once and print it
    Query {
        /// Topic to search; multiple words are joined with spaces
        #[arg(required = true)]
        topic: Vec<String>,

        /// Presentation mode (defaults to display.mode from config)
        #[arg(long, value_enum)]
        mode: Option<ViewMode>,

        /// Print the raw result as JSON instead of rendering it
        #[arg(long)]
        json: bool,
    },
    /// Interactive session; starts by loading the first preset topic
    Shell {
        #[arg(long, value_enum)]
        mode: Option<ViewMode>,
    },
    /// Serve the JSON API
    Serve,
    /// List preset topics
    Topics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so `query --json` stays machine-readable
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if dotenv::dotenv().is_ok() {
        info!(".env loaded");
    }

    let config = load_config(args.config).await?;

    match args.command {
        Cmd::Topics => {
            for (i, topic) in PRESET_TOPICS.iter().enumerate() {
                println!("{}. {}  ({})", i + 1, topic, strip_emoji(topic));
            }
            Ok(())
        }
        Cmd::Query { topic, mode, json } => {
            let topic = topic.join(" ");
            let topic = topic.trim();
            if topic.is_empty() {
                anyhow::bail!("Topic must not be empty");
            }
            let pipeline = create_pipeline(&config)?;

            if json {
                let result = pipeline.fetch_news(topic).await;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("Failed to encode result")?
                );
                return Ok(());
            }

            let mode = resolve_mode(mode, &config)?;
            let mut console = Console::new(tokio::io::stdout(), mode, Typing::from_config(&config.display));
            search_and_show(&pipeline, &mut console, topic).await?;
            Ok(())
        }
        Cmd::Shell { mode } => {
            let mode = resolve_mode(mode, &config)?;
            let pipeline = create_pipeline(&config)?;
            let mut console = Console::new(tokio::io::stdout(), mode, Typing::from_config(&config.display));
            let input = BufReader::new(tokio::io::stdin());

            tokio::select! {
                res = run_shell(&pipeline, input, &mut console) => res?,
                _ = tokio::signal::ctrl_c() => {
                    info!("ctrl-c received, ending session");
                }
            }
            Ok(())
        }
        Cmd::Serve => {
            let pipeline = Arc::new(create_pipeline(&config)?);
            if let Err(e) = launch_rocket(pipeline, &config.server).await {
                error!(%e, "Rocket server failed");
                return Err(e);
            }
            info!("Shutdown complete");
            Ok(())
        }
    }
}

/// Merge `config.default.toml` with `--config` (or `./config.toml`); every field has a default.
async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(%e, "failed to load configuration");
        e
    })?;
    info!(default = ?default_path, override_file = ?override_path, "configuration loaded");
    Ok(config)
}

fn resolve_mode(cli: Option<ViewMode>, config: &Config) -> Result<ViewMode> {
    match cli {
        Some(mode) => Ok(mode),
        None => ViewMode::from_config(config.display.mode.as_deref()),
    }
}

/// Build the Gemini-backed pipeline. A missing API key is only a warning: the first search
/// reports it to the user as an invalid key.
fn create_pipeline(config: &Config) -> Result<NewsPipeline> {
    let llm = &config.llm;
    let api_url = llm.api_url()?;
    let api_key = llm.api_key();
    if api_key.is_none() {
        warn!(env = %llm.api_key_env(), "API key env var not set; searches will fail");
    }

    let provider = GeminiProvider::new(api_url.clone(), api_key, llm.model());
    info!(model = %provider.model(), api_url = %api_url, timeout_secs = llm.timeout().as_secs(), "search provider initialized");

    let provider: Arc<dyn LlmProvider> = Arc::new(provider);
    Ok(NewsPipeline::new(provider, llm.timeout()))
}
