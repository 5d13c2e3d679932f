//! # JetStream — Paced Batch Dispatch Server
//!
//! Uploads a CSV of attribution event rows and replays them to the
//! AppsFlyer S2S endpoint spread evenly over a configured window,
//! with Telegram operational notifications and an admin HTTP API.
//!
//! Usage:
//!   jetstream                        # Start server (default port 3000)
//!   jetstream --port 8080            # Custom port
//!   jetstream --config ./js.toml     # Custom config path

use anyhow::Result;
use clap::Parser;
use jetstream_core::JetStreamConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "jetstream",
    version,
    about = "🚀 JetStream — paced batch dispatcher for AppsFlyer S2S events"
)]
struct Cli {
    /// Path to config file (default: ~/.jetstream/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "jetstream=debug,jetstream_engine=debug,jetstream_gateway=debug,tower_http=debug"
    } else {
        "jetstream=info,jetstream_engine=info,jetstream_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Load config: --config flag, then JETSTREAM_CONFIG, then default.
    let mut config = match cli
        .config
        .or_else(|| std::env::var("JETSTREAM_CONFIG").ok())
    {
        Some(path) => {
            let expanded = shellexpand::tilde(&path).to_string();
            JetStreamConfig::load_from(std::path::Path::new(&expanded))?
        }
        None => JetStreamConfig::load()?,
    };

    if let Some(host) = cli.host {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    jetstream_gateway::start(config).await
}
