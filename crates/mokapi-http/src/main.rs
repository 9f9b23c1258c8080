//! MokAPI mock HTTP server.
//!
//! Usage:
//!   mokapi [--definitions-path <DIR>] [--host <HOST>] [--port <PORT>] [OPTIONS]

use anyhow::Context;
use clap::Parser;
use mokapi_http::config::Config;
use mokapi_http::{ChangeWatcher, MockServer, Registry, Resolver};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// MokAPI mock HTTP server
#[derive(Parser, Debug)]
#[command(name = "mokapi")]
#[command(
    author,
    version,
    about = "Serve canned HTTP responses from definition files or a management API"
)]
struct Args {
    /// YAML or JSON config file; flags override its values
    #[arg(short, long, env = "MOKAPI_CONFIG")]
    config: Option<PathBuf>,

    /// Path to folder containing the definitions of endpoints (empty disables them)
    #[arg(long, env = "MOKAPI_DEFINITIONS_PATH")]
    definitions_path: Option<String>,

    /// Host we start the service on
    #[arg(long, env = "MOKAPI_HOST")]
    host: Option<String>,

    /// Port we start the service on
    #[arg(short, long, env = "MOKAPI_PORT")]
    port: Option<u16>,

    /// Interval in milliseconds to check definitions for changes
    #[arg(long, env = "MOKAPI_CHECK_INTERVAL_MS")]
    check_interval_ms: Option<u64>,

    /// Debug logging toggle
    #[arg(short, long, env = "MOKAPI_DEBUG")]
    debug: bool,
}

impl Args {
    /// Merge the optional config file with command line overrides
    fn into_config(self) -> Result<Config, anyhow::Error> {
        let mut config = match self.config {
            Some(ref path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(path) = self.definitions_path {
            config.definitions_path = path;
        }
        if let Some(host) = self.host {
            config.listen.host = host;
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(interval) = self.check_interval_ms {
            config.check_interval_ms = interval;
        }
        config.debug |= self.debug;

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Args::parse().into_config()?;
    init_tracing(config.debug);

    info!(
        host = %config.listen.host,
        port = config.listen.port,
        "Starting the MokAPI service"
    );

    let (shutdown_tx, _) = broadcast::channel(1);
    let api_definitions = Arc::new(Registry::in_memory());

    // Only load and watch if we have a path to use
    let (file_definitions, watcher_task) = match config.definitions_dir() {
        Some(dir) => {
            info!(path = %dir.display(), "Scanning the path for definitions");
            let registry = Arc::new(Registry::file_backed(dir));

            let loader = Arc::clone(&registry);
            let loaded = tokio::task::spawn_blocking(move || loader.load())
                .await
                .context("Definition loading task failed")?;
            let count = match loaded {
                Ok(count) => count,
                Err(e) => {
                    error!(error = %e, "Failed to load definitions");
                    return Err(e).context("Failed to load definitions");
                }
            };
            info!(definitions = count, "File definitions loaded");

            let watcher = ChangeWatcher::new(Arc::clone(&registry), config.check_interval());
            let task = watcher.spawn(shutdown_tx.subscribe());
            (registry, Some(task))
        }
        None => {
            info!("No definitions path configured, file definitions disabled");
            (Arc::new(Registry::in_memory()), None)
        }
    };

    let resolver = Arc::new(Resolver::new(api_definitions, file_definitions));
    let server = MockServer::new(config.listen.host.clone(), config.listen.port, resolver);
    let mut server_task = tokio::spawn(server.run(shutdown_tx.subscribe()));

    tokio::select! {
        joined = &mut server_task => {
            // Only reached when the server stops on its own, e.g. bind failure
            return joined.context("Server task failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(());
    server_task.await.context("Server task failed")??;
    if let Some(task) = watcher_task {
        task.await.context("Watcher task failed")?;
    }

    info!("MokAPI stopped");
    Ok(())
}
