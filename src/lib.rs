pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod excel;
pub mod services;
pub mod state;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::SeedAdmin {
            email,
            password,
            name,
        }) => seed_admin(config, &email, &password, &name).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!(
        "Tracktower v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://{addr}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn seed_admin(
    config: Config,
    email: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    let user = shared
        .auth
        .seed_admin(email, password, name)
        .await
        .map_err(|e| anyhow::anyhow!("Seeding admin failed: {e}"))?;

    info!("Admin account ready: {} (id {})", user.email, user.id);
    Ok(())
}
