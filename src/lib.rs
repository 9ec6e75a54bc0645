pub mod cli;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod library;
pub mod models;
pub mod services;
pub mod state;

use clap::{CommandFactory, Parser};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, SourceCommands};
pub use config::Config;
use state::AppContext;

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, leaving it untouched.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;
    init_tracing(&config);

    let ctx = AppContext::new(config).await?;

    match command {
        Commands::Init => Ok(()),
        Commands::Daemon => run_daemon(ctx).await,
        Commands::Source { command } => match command {
            SourceCommands::Add { name, path, owner } => {
                cli::cmd_source_add(&ctx, &name, &path, owner).await
            }
            SourceCommands::List => cli::cmd_source_list(&ctx).await,
            SourceCommands::Remove { id } => cli::cmd_source_remove(&ctx, id).await,
        },
        Commands::Scan {
            id,
            all,
            background,
        } => match id {
            Some(id) if !all => cli::cmd_scan(&ctx, id, background).await,
            _ => cli::cmd_scan_all(&ctx).await,
        },
        Commands::History { id, limit } => cli::cmd_history(&ctx, id, limit).await,
        Commands::Status { id } => cli::cmd_status(&ctx, id).await,
    }
}

async fn run_daemon(ctx: AppContext) -> anyhow::Result<()> {
    info!(
        "shelfsync v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    ctx.store.ping().await?;

    let scheduler = ctx.scheduler().await;
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let mut events = ctx.event_bus.subscribe();
    let events_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => info!(event = "notification", payload = %json, "Event"),
                    Err(e) => error!("Failed to serialize event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    events_handle.abort();
    info!("Daemon stopped");

    Ok(())
}
