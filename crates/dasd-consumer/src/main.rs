//! Consumer process entry point (§4.13): parse CLI args, load configuration,
//! initialise logging, connect the store, and run the stage-worker pipeline
//! until a shutdown signal arrives.

use std::path::PathBuf;

use clap::Parser;

use dasd_consumer::bootstrap;
use dasd_telemetry::{DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig, build_sha, init_logging};

/// The `dasd-consumer` process: moves torrents and package files through the
/// packaging/download/extraction pipeline.
#[derive(Parser, Debug)]
#[command(name = "dasd-consumer", version, about = "Moves packaged torrents through download and extraction")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "consumer.toml")]
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
    let _app_span = GlobalContextGuard::new("consumer");

    if let Err(error) = run(config).await {
        tracing::error!(error = ?error, "consumer exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: dasd_config::AppConfig) -> anyhow::Result<()> {
    let mut app = bootstrap::build(&config).await?;

    app.completed_torrent_monitor.start().await?;
    app.completed_torrent_packager.start().await?;
    app.packaged_torrent_monitor.start().await?;
    app.packaged_torrent_lister.start().await?;
    app.package_downloader.start().await?;
    app.package_extractor.start().await?;
    app.torrent_deleter.start().await?;

    let registry = app.registry.clone();
    let registry_handle = tokio::spawn(async move { registry.run().await });

    wait_for_shutdown_signal().await;
    tracing::info!("consumer shutting down");

    app.registry.stop();
    app.dispatcher.stop().await;

    // The monitor groups are pollers with no stop sentinel of their own; they
    // are dropped, not joined, when the process exits below.
    app.completed_torrent_packager.join().await;
    app.packaged_torrent_lister.join().await;
    app.package_downloader.join().await;
    app.package_extractor.join().await;
    app.torrent_deleter.join().await;
    registry_handle.await?;

    Ok(())
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
}
