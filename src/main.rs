// src/main.rs

use std::sync::Arc;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use sonar_relay::config::RelayConfig;
use sonar_relay::llm::PerplexityClient;
use sonar_relay::relay::SessionRelay;
use sonar_relay::server::{self, AppState};
use sonar_relay::session::{SessionLocks, SessionStore, spawn_eviction_sweeper};

#[derive(Parser)]
#[command(name = "sonar-relay")]
#[command(about = "Session-keeping HTTP relay for Perplexity chat completions")]
#[command(version)]
struct Args {
    /// Bind host (overrides RELAY_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides RELAY_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve values: CLI args > env vars (.env honored) > defaults
    let mut config = RelayConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize tracing
    let level = config.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    config.validate()?;

    info!("Starting sonar-relay");
    info!("Model: {}", config.upstream.model);
    if config.upstream.api_key.is_empty() {
        info!("API key: not configured (chat requests will be rejected)");
    } else {
        info!("API key: configured");
    }

    let store = Arc::new(SessionStore::new());
    let locks = Arc::new(SessionLocks::new());
    let backend = Arc::new(PerplexityClient::new(&config.upstream));
    let relay = Arc::new(SessionRelay::new(store.clone(), locks.clone(), backend));

    let state = AppState {
        relay,
        store: store.clone(),
        model: config.upstream.model.clone(),
    };

    if config.sessions.eviction_enabled() {
        // Run server and eviction sweeper concurrently
        let sweeper = spawn_eviction_sweeper(store, locks, config.sessions.clone());
        info!(
            "Session eviction sweeper started - running every {} seconds",
            config.sessions.sweep_interval().as_secs()
        );

        tokio::select! {
            result = server::run(&config.server, state) => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                }
            }
            _ = sweeper => {
                error!("Eviction sweeper unexpectedly terminated");
            }
        }
    } else {
        server::run(&config.server, state).await?;
    }

    Ok(())
}
