use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mirserver::{GameServerBuilder, LoginServerBuilder, MirConfig};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mirserver")]
#[command(about = "Mir login server and game servers in one process", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "mirserver.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = MirConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    tracing::info!(
        path = %args.config.display(),
        servers = config.servers.len(),
        users = config.users.len(),
        "configuration loaded"
    );

    let store = Arc::new(config.memory_store());
    let mut tasks = JoinSet::new();
    let mut login = LoginServerBuilder::from_config(&config.login).codec(config.codec.clone());

    for server in &config.servers {
        let game = GameServerBuilder::new(server.info.id)
            .bind(&server.bind)
            .codec(config.codec.clone())
            .config(config.game.clone())
            .build(Arc::clone(&store))
            .await
            .with_context(|| format!("failed to start game server {}", server.info.name))?;

        login = login.route(game.cert_sender());
        tasks.spawn(game.run());
    }

    let login = login
        .build(store)
        .await
        .context("failed to start login server")?;
    tasks.spawn(login.run());

    // The servers only return on failure; the first one to do so stops the process.
    if let Some(result) = tasks.join_next().await {
        result.context("server task panicked")??;
    }
    Ok(())
}
