use anyhow::{anyhow, Result};
use clap::Args;
use sqlspell::database::SqliteLevelStore;
use sqlspell::lens::grade::{GradeLens, GradeOptions};
use sqlspell::server::{start_server, ServerConfig, ServerState};
use sqlspell::SpellConfig;
use std::sync::Arc;
use tracing::info;

/// Arguments for the Serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind to (overrides the configured address)
    #[clap(short, long)]
    pub address: Option<String>,

    /// Port to listen on (overrides the configured port)
    #[clap(short, long)]
    pub port: Option<u16>,
}

pub fn run(config: &SpellConfig, args: ServeArgs) -> Result<()> {
    let ServeArgs { address, port } = args;

    let mut server_config = ServerConfig::from(config);
    if let Some(address) = address {
        server_config = server_config.with_address(address);
    }
    if let Some(port) = port {
        server_config = server_config.with_port(port);
    }

    std::fs::create_dir_all(&config.scratch_dir)
        .map_err(|e| anyhow!("Failed to create scratch directory {}: {}", config.scratch_dir, e))?;

    let store = SqliteLevelStore::open(&config.levels_path())?;
    info!(
        "Serving {} levels from {}",
        store.count()?,
        config.levels_path()
    );

    let state = ServerState::new(Arc::new(store), GradeLens::new(GradeOptions::from(config)));

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow!("Failed to start async runtime: {}", e))?;
    eprintln!("Listening on http://{}", server_config.bind_address());
    runtime.block_on(start_server(state, server_config))
}
