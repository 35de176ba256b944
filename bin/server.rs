// Zimam Delivery - Web Server
// REST API over the logbook, wallet and language settings

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use zimam_delivery::api::{router, AppState};
use zimam_delivery::{config, AppContext, Settings};

#[derive(Parser, Debug)]
#[command(name = "zimam-server", version, about = "Zimam Delivery REST API")]
struct Args {
    /// Settings file (defaults to ./zimam.toml when present)
    #[arg(short, long, env = "ZIMAM_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the settings file
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database, overrides the settings file
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if args.database.is_some() {
        settings.database = args.database;
    }

    config::init_tracing(&settings.log_level);

    let clock = settings.clock();
    let ctx = match &settings.database {
        Some(path) => AppContext::open(path, clock, settings.language)?,
        None => {
            tracing::warn!("no database configured, records live only as long as the server");
            AppContext::in_memory(clock, settings.language)
        }
    }
    .with_actor("server");

    let app = router(AppState::new(ctx));

    let addr = settings.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "🚀 Zimam Delivery API listening");
    tracing::info!("   API: http://{}/api/deliveries", addr);

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
