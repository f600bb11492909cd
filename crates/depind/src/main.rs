//! depind: the DePIN hub daemon.
//!
//! Single binary that assembles the hub:
//! - Workload catalog (descriptor directory)
//! - Installation store (redb)
//! - Compose runtime (docker CLI)
//! - Lifecycle manager
//! - REST API
//!
//! # Usage
//!
//! ```text
//! depind serve --config hub.toml --port 3000
//! depind catalog --catalog-dir ./apps
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use depin_compose::DockerCompose;
use depin_core::{Catalog, HubConfig};
use depin_lifecycle::{LifecycleManager, LifecycleOptions};
use depin_state::StateStore;

const DEFAULT_LOG_FILTER: &str = "info,depind=debug,depin=debug";

#[derive(Parser)]
#[command(name = "depind", about = "DePIN hub daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Settings shared by every subcommand; flags override the config file.
#[derive(clap::Args)]
struct ConfigArgs {
    /// Path to hub.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory per workload.
    #[arg(long)]
    catalog_dir: Option<PathBuf>,

    /// Directory for the installation store.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<HubConfig> {
        let mut config = match &self.config {
            Some(path) => HubConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => HubConfig::default(),
        };
        if let Some(dir) = &self.catalog_dir {
            config.catalog_dir = dir.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve the hub API.
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the workload catalog as JSON.
    Catalog {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve { config, port } => {
            let mut config = config.load()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Command::Catalog { config } => {
            let config = config.load()?;
            let workloads = Catalog::new(&config.catalog_dir).list()?;
            println!("{}", serde_json::to_string_pretty(&workloads)?);
            Ok(())
        }
        Command::Config { config } => {
            print!("{}", config.load()?.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run_server(config: HubConfig) -> anyhow::Result<()> {
    info!("DePIN hub daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let catalog = Catalog::new(&config.catalog_dir);
    match catalog.list() {
        Ok(workloads) => info!(dir = ?config.catalog_dir, count = workloads.len(), "catalog loaded"),
        Err(e) => warn!(dir = ?config.catalog_dir, error = %e, "catalog not readable yet"),
    }

    let store_path = config.store_path();
    let store = StateStore::open(&store_path)
        .with_context(|| format!("failed to open installation store at {}", store_path.display()))?;
    info!(path = ?store_path, "installation store opened");

    let runtime = Arc::new(DockerCompose::from_config(&config.runtime));
    info!(docker_bin = %config.runtime.docker_bin, "compose runtime configured");

    let manager = LifecycleManager::new(
        catalog,
        store,
        runtime,
        LifecycleOptions::from(&config.lifecycle),
    );
    if !manager.runtime_available().await {
        warn!("container runtime unavailable; lifecycle operations will fail until it is reachable");
    }

    // ── Start API server ───────────────────────────────────────

    let router = depin_api::build_router(manager);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("DePIN hub daemon stopped");
    Ok(())
}
