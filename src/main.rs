//! potoken-provider binary
//!
//! Two modes of operation:
//!
//! - **Server mode** (default): keeps the cached token fresh on a periodic
//!   schedule and serves it over HTTP (`/token`, `/update`).
//! - **One-shot mode** (`--one-shot`): runs a single extraction attempt,
//!   prints the captured record as JSON on stdout, and exits non-zero when
//!   extraction fails or the token looks implausible.
//!
//! # Usage
//!
//! ```bash
//! potoken-provider --port 8080 --update-interval 300
//! potoken-provider --one-shot --browser-path /usr/bin/chromium
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use potoken_provider::{Error, Settings, UpdateCoordinator, server::create_app};

/// Caching proof-of-origin token provider
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Seconds between scheduled token updates
    #[arg(short, long, value_name = "SECONDS")]
    update_interval: Option<u64>,

    /// Browser executable to launch instead of the autodetected one
    #[arg(short, long, value_name = "PATH")]
    browser_path: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single extraction attempt, print the result, and exit
    #[arg(short, long)]
    one_shot: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.one_shot, cli.verbose);

    let settings = load_settings(&cli)?;

    if cli.one_shot {
        run_one_shot(settings).await
    } else {
        run_server(settings).await
    }
}

/// Server mode logs to stdout; one-shot mode logs to stderr so stdout stays
/// machine-readable JSON.
fn init_logging(one_shot: bool, verbose: bool) {
    if one_shot {
        let default_filter = if verbose { "debug" } else { "warn" };
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }
}

/// Merge configuration sources: defaults < file/environment < CLI arguments
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load configuration from {path:?}"))?,
        None => Settings::from_env().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings from environment: {e}. Using defaults.");
            Settings::default()
        }),
    };

    settings.server.host = cli.host.clone();
    settings.server.port = cli.port;
    if let Some(interval) = cli.update_interval {
        settings.extractor.update_interval_secs = interval;
    }
    if let Some(path) = &cli.browser_path {
        settings.extractor.browser_path = Some(path.clone());
    }
    settings.logging.verbose |= cli.verbose;

    settings.validate()?;
    Ok(settings)
}

/// One extraction attempt; stdout carries the record, the exit code carries
/// the verdict
async fn run_one_shot(settings: Settings) -> anyhow::Result<()> {
    let coordinator = UpdateCoordinator::new(settings);

    match coordinator.run_once().await {
        Ok(record) => {
            println!("{}", record.to_json()?);
            if !record.is_plausible() {
                eprintln!(
                    "Warning: {}",
                    Error::implausible_token(record.po_token.len())
                );
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to extract token: {e}");
            std::process::exit(1);
        }
    }
}

/// Periodic schedule plus the publishing API, until ctrl-c
async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let addr = parse_bind_address(&settings.server.host, settings.server.port)?;

    let coordinator = Arc::new(UpdateCoordinator::new(settings));
    let app = create_app(Arc::clone(&coordinator));

    // Bind failures are the one class of error that kills the process
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        "Starting potoken-provider v{} at http://{addr}/",
        env!("CARGO_PKG_VERSION")
    );

    let schedule = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        async move { coordinator.run().await }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    coordinator.stop();
    let _ = schedule.await;
    tracing::info!("Server stopped.");
    Ok(())
}

/// Resolve the configured bind address
fn parse_bind_address(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let ip: IpAddr = host.parse().map_err(|_| {
        anyhow::anyhow!("Invalid bind address: {host}. Use an IP address such as 0.0.0.0 or ::")
    })?;
    Ok(SocketAddr::new(ip, port))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address_ipv4() {
        let addr = parse_bind_address("127.0.0.1", 8080).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_bind_address_ipv6_any() {
        let addr = parse_bind_address("::", 8080).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_parse_bind_address_rejects_hostnames() {
        assert!(parse_bind_address("localhost", 8080).is_err());
        assert!(parse_bind_address("", 8080).is_err());
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["potoken-provider"]);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.host, "0.0.0.0");
        assert!(cli.update_interval.is_none());
        assert!(!cli.one_shot);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_custom_values() {
        let cli = Cli::parse_from([
            "potoken-provider",
            "--port",
            "9090",
            "--host",
            "::",
            "--update-interval",
            "60",
            "--one-shot",
            "--verbose",
        ]);
        assert_eq!(cli.port, 9090);
        assert_eq!(cli.host, "::");
        assert_eq!(cli.update_interval, Some(60));
        assert!(cli.one_shot);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "potoken-provider",
            "--port",
            "9001",
            "--update-interval",
            "42",
            "--browser-path",
            "/opt/chromium/chrome",
        ]);
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.extractor.update_interval_secs, 42);
        assert_eq!(
            settings.extractor.browser_path,
            Some(PathBuf::from("/opt/chromium/chrome"))
        );
    }
}
