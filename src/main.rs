use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use hikari::config::Config;
use hikari::edge::{EdgeEvent, QueryNormalizer};
use hikari::logging::{init_stderr_subscriber, init_subscriber, LogFormat};
use hikari::origin::{OriginEvent, OriginService};
use hikari::server::OriginServer;
use hikari::storage::build_stores;

/// Hikari - on-the-fly image optimization
#[derive(Parser, Debug)]
#[command(name = "hikari")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the origin transform server
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Normalize one viewer-request event and print the rewritten request
    Rewrite {
        /// Event JSON file (stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Run one origin event and print the JSON response
    Invoke {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
        /// Event JSON file (stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Serve { config } => serve(&config).await,
        Command::Rewrite { event } => rewrite(event.as_deref()),
        Command::Invoke { config, event } => invoke(&config, event.as_deref()).await,
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn read_event(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event from {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read event from stdin")?;
            Ok(input)
        }
    }
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    init_subscriber(config.server.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = %config_path.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        storage_backend = ?config.storage.backend,
        "Configuration loaded successfully"
    );

    let stores = build_stores(&config.storage)
        .await
        .context("Failed to set up object storage")?;
    let service = OriginService::new(stores, &config.origin);

    OriginServer::new(service, &config.server)
        .run()
        .await
        .context("Server failed")
}

fn rewrite(event_path: Option<&Path>) -> anyhow::Result<()> {
    init_stderr_subscriber(LogFormat::Json).ok();

    let input = read_event(event_path)?;
    let mut event = EdgeEvent::from_json(&input).context("Invalid edge event")?;

    QueryNormalizer::default().normalize(&mut event.request);

    println!("{}", serde_json::to_string_pretty(&event.request)?);
    Ok(())
}

async fn invoke(config_path: &Path, event_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    init_stderr_subscriber(config.server.log_format).ok();

    let input = read_event(event_path)?;
    let event = OriginEvent::from_json(&input).context("Invalid origin event")?;

    let stores = build_stores(&config.storage)
        .await
        .context("Failed to set up object storage")?;
    let service = OriginService::new(stores, &config.origin);

    let response = service.handle(event.into_request()).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&response.into_event_response())?
    );
    Ok(())
}
