use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use devcamper_api::config::config;
use devcamper_api::database::{MemoryStore, PgStore, Store};
use devcamper_api::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "devcamper-api", version, about = "DevCamper bootcamp directory API")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep all records in memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config();
    tracing::info!("Starting DevCamper API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match (&config.database.url, args.memory) {
        (Some(url), false) => {
            let store = PgStore::connect(url, &config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            store.ensure_schema().await.context("failed to create schema")?;
            Arc::new(store)
        }
        _ => {
            tracing::warn!("No database configured, records are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("DevCamper API listening on http://{}", bind_addr);
    axum::serve(listener, app(AppState::new(store))).await.context("server error")?;
    Ok(())
}
