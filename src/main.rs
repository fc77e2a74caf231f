mod config;
mod replay;
mod service;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use engine::sync::{EditService, SyncError, SyncGateway};

use crate::config::{Config, ConfigArgs, ConfigError};
use crate::service::HttpEditService;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("editing service at {url} is unreachable: {message}")]
    Unreachable { url: String, message: String },
}

#[derive(Parser, Debug)]
#[command(name = "absmove", about = "Move and resize absolutely positioned document elements")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the document-editing service answers.
    Probe,
    /// Undo the service's last edit of a document.
    Undo {
        /// Rendered document path or URL, e.g. `/talks/deck.html`.
        #[arg(long)]
        document: String,
    },
    /// Redo the service's last undone edit of a document.
    Redo {
        #[arg(long)]
        document: String,
    },
    /// Replay a scripted scene and gestures against the service.
    Replay {
        /// JSON script with `layout`, `nodes`, and `gestures`.
        #[arg(long)]
        script: PathBuf,
        #[arg(long)]
        document: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_args(&cli.config)?;
    let service = HttpEditService::new(&config.service_url, config.connect_timeout)?;
    tracing::debug!(url = %config.service_url, "service configured");

    match cli.command {
        Command::Probe => run_probe(&config, &service).await,
        Command::Undo { document } => run_history(service, &document, false).await,
        Command::Redo { document } => run_history(service, &document, true).await,
        Command::Replay { script, document } => run_replay(&config, service, &script, &document).await,
    }
}

async fn run_probe(config: &Config, service: &HttpEditService) -> Result<(), CliError> {
    service.health().await.map_err(|e| CliError::Unreachable {
        url: config.service_url.clone(),
        message: e.to_string(),
    })?;
    println!("ok");
    Ok(())
}

async fn run_history(service: HttpEditService, document: &str, redo: bool) -> Result<(), CliError> {
    let gateway = SyncGateway::new(service, document)?;
    let request = if redo { gateway.redo_request() } else { gateway.undo_request() };
    gateway.submit(&request).await?;
    println!("{} successful", if redo { "Redo" } else { "Undo" });
    Ok(())
}

async fn run_replay(
    config: &Config,
    service: HttpEditService,
    script: &Path,
    document: &str,
) -> Result<(), CliError> {
    let raw = tokio::fs::read_to_string(script)
        .await
        .map_err(|source| CliError::Read { path: script.to_path_buf(), source })?;
    let script: replay::Script = serde_json::from_str(&raw)?;
    let gateway = SyncGateway::new(service, document)?;
    let report = replay::run(script, gateway, config.engine_config()).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
