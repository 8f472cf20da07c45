//! Producer process entry point (§4.13): parse CLI args, load configuration,
//! initialise logging, connect the store, and serve the HTTP API until a
//! shutdown signal arrives.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use dasd_producer::bootstrap;
use dasd_telemetry::{DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig, build_sha, init_logging};

/// The `dasd-producer` process: serves completed torrents as packaged chunks.
#[derive(Parser, Debug)]
#[command(name = "dasd-producer", version, about = "Serves completed torrents as packaged chunks")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "producer.toml")]
    config: PathBuf,

    /// Override the tracing log level (otherwise `RUST_LOG` or `info`).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = cli.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let config = match dasd_config::load(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load configuration from {}: {error}", cli.config.display());
            std::process::exit(78);
        }
    };

    let logging = LoggingConfig {
        level: &level,
        format: LogFormat::infer(),
        build_sha: build_sha(),
    };
    if let Err(error) = init_logging(&logging) {
        eprintln!("failed to initialise logging: {error}");
        std::process::exit(70);
    }
    let _app_span = GlobalContextGuard::new("producer");

    if let Err(error) = run(config).await {
        tracing::error!(error = ?error, "producer exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: dasd_config::AppConfig) -> anyhow::Result<()> {
    let bind_addr = bind_address(&config.http_client.base_url)?;
    let app = bootstrap::build(&config).await?;

    let cancel = CancellationToken::new();
    let monitor_handle = tokio::spawn(app.monitor.run(cancel.clone()));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "producer listening");

    axum::serve(listener, app.router)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            cancel.cancel();
        })
        .await?;

    monitor_handle.await??;
    Ok(())
}

fn bind_address(base_url: &str) -> anyhow::Result<SocketAddr> {
    let url = url::Url::parse(base_url)?;
    let port = url.port_or_known_default().unwrap_or(80);
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
