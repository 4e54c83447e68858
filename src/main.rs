//! Run Tracking API Server
//!
//! Entry point serving the GraphQL endpoint over the run log.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use run_tracking_api::api::graphql::build_schema;
use run_tracking_api::config::{AppConfig, Cli};
use run_tracking_api::persistence::providers::memory::InMemoryRunStore;
use run_tracking_api::runs::RunQueryService;
use run_tracking_api::{server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();

    if cli.print_schema {
        let service = RunQueryService::new(Arc::new(InMemoryRunStore::default()));
        println!("{}", build_schema(service).sdl());
        return Ok(());
    }

    let config = match AppConfig::from_cli(&cli) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(config.telemetry.format);

    info!(
        name: "config.loaded",
        port = config.server.port,
        provider = %config.persistence.provider,
        "Configuration loaded"
    );

    server::start_server(config).await
}
