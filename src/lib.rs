pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands, KeyCommands, UserCommands};
pub use config::Config;
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "bookmarks")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    match cli.command {
        None | Some(Commands::Serve { .. }) => run_server(config, prometheus_handle).await,

        Some(Commands::Init) => {
            let created = match &cli.config {
                Some(path) if !path.exists() => {
                    Config::default().save_to_path(path)?;
                    true
                }
                Some(_) => false,
                None => Config::create_default_if_missing()?,
            };
            if created {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        Some(Commands::User { command }) => {
            let state = SharedState::new(config).await?;
            let auth = state.auth_service.as_ref();
            match command {
                UserCommands::Set { username, password } => {
                    cli::cmd_user_set(auth, &username, &password).await
                }
                UserCommands::Delete { username } => cli::cmd_user_delete(auth, &username).await,
                UserCommands::List => cli::cmd_user_list(auth).await,
            }
        }

        Some(Commands::Key { command }) => {
            let state = SharedState::new(config).await?;
            let auth = state.auth_service.as_ref();
            match command {
                KeyCommands::Create { name } => cli::cmd_key_create(auth, &name).await,
                KeyCommands::List => cli::cmd_key_list(auth).await,
                KeyCommands::Delete { id } => cli::cmd_key_delete(auth, id).await,
            }
        }
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Bookmarks v{} starting...", env!("CARGO_PKG_VERSION"));

    let addr = config.listen_address();
    let shared = Arc::new(SharedState::new(config).await?);

    match shared.auth_service.clean_up_sessions().await {
        Ok(removed) => info!(removed, "Expired sessions cleaned up"),
        Err(e) => warn!("Failed to clean up expired sessions: {}", e),
    }

    if shared.auth_service.list_users().await?.is_empty() {
        warn!("No users configured. Add one with 'bookmarks user set <username> <password>'");
    }

    let app = api::router(api::create_app_state(shared, prometheus_handle));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
