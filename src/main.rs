//! gpu-bridge: command-line front end for the multi-host GPU client
//!
//! Runs one operation against the configured pool of GPU hosts and prints
//! the JSON result.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use gpu_bridge::api::{BertScoreRequest, EmbedRequest};
use gpu_bridge::config::BridgeConfig;
use gpu_bridge::BridgeClient;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "gpu-bridge")]
#[command(version)]
#[command(about = "Multi-host client for a remote GPU embedding/BERTScore service")]
#[command(long_about = "
gpu-bridge talks to one or more GPU service hosts as a single endpoint:
  - Round-robin or least-busy (VRAM) host selection
  - Failover to the next host when one is down
  - Retry-After aware handling of overloaded (503) hosts

Example usage:
  gpu-bridge --config gpu-bridge.yaml health
  gpu-bridge embed --text \"hello\" --text \"world\"
  gpu-bridge hosts
")]
struct Cli {
    /// Path to config file (defaults to gpu-bridge.yaml, gpu-bridge.yml or ./config/gpu-bridge.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,

    /// Show device and model information
    Info,

    /// Show queue status
    Status,

    /// Compute embeddings for one or more texts
    Embed {
        /// Text to embed (repeatable)
        #[arg(short, long = "text", required = true)]
        texts: Vec<String>,
        /// Embedding model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Compute BERTScore for candidate/reference pairs
    Bertscore {
        /// Candidate text (repeatable)
        #[arg(long = "candidate", required = true)]
        candidates: Vec<String>,
        /// Reference text (repeatable)
        #[arg(long = "reference", required = true)]
        references: Vec<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        model_type: Option<String>,
    },

    /// Probe every host and print its state
    Hosts,

    /// Validate configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::CheckConfig => {
            check_config(cli.config.as_deref());
            return Ok(());
        }
        command => command,
    };

    let config = load_config_or_exit(cli.config.as_deref());
    let mut client = BridgeClient::new(config)?;

    match command {
        Commands::Health => print_json(&client.health().await?)?,
        Commands::Info => print_json(&client.info().await?)?,
        Commands::Status => print_json(&client.status().await?)?,
        Commands::Embed { texts, model } => {
            let req = EmbedRequest { texts, model };
            print_json(&client.embed(req).await?)?;
        }
        Commands::Bertscore {
            candidates,
            references,
            lang,
            model_type,
        } => {
            let req = BertScoreRequest {
                candidates,
                references,
                lang,
                model_type,
            };
            print_json(&client.bertscore(req).await?)?;
        }
        Commands::Hosts => {
            client.check_hosts().await;
            print_json(&client.hosts())?;
        }
        Commands::CheckConfig => {}
    }

    client.shutdown().await;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Validate configuration file
fn check_config(config_path: Option<&Path>) {
    let config = load_config_or_exit(config_path);
    match config.resolved_hosts() {
        Ok(hosts) => {
            println!("✓ Configuration file is valid\n");
            println!("Hosts:");
            for (i, host) in hosts.iter().enumerate() {
                let name = host.name.clone().unwrap_or_else(|| format!("gpu-{}", i + 1));
                let auth = if host.api_key.is_some() { "api key" } else { "no auth" };
                println!("  {:12} {} ({})", name, host.base_url(), auth);
            }
            println!("\nLoad balancing: {}", config.load_balancing.as_str());
            println!("Timeout: {}s", config.timeout_seconds);
            println!("Health check interval: {}s", config.health_check_interval_seconds);
            println!("\nLimits:");
            println!("  Max batch size: {}", config.limits.max_batch_size);
            println!("  Max text length: {}", config.limits.max_text_length);
            if let Some(ref model) = config.models.embed {
                println!("\nDefault embed model: {}", model);
            }
            if let Some(ref model) = config.models.bertscore {
                println!("Default BERTScore model: {}", model);
            }
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load configuration or exit with error
fn load_config_or_exit(config_path: Option<&Path>) -> BridgeConfig {
    match BridgeConfig::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!("\nMake sure you have a gpu-bridge.yaml file, for example:");
            eprintln!("  hosts:");
            eprintln!("    - url: \"http://gpu-box:8765\"");
            std::process::exit(1);
        }
    }
}
