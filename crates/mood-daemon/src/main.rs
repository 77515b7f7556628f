mod http;

use std::sync::Arc;

use mood_proto::catalog::load_or_seed_catalog;
use mood_proto::config::Config;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // File log + stderr
    let data_dir = mood_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("daemon.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,mood_daemon=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    if !config.http.enabled {
        warn!("HTTP server disabled in config, nothing to serve");
        return Ok(());
    }

    let catalog = load_or_seed_catalog(&config.catalog.playlists_toml)?;
    info!(
        "Loaded {} playlist keys from {:?}",
        catalog.len(),
        config.catalog.playlists_toml
    );

    let handle = http::start_server(
        config.http.bind_address.clone(),
        config.http.port,
        Arc::new(catalog),
    );

    tokio::select! {
        res = handle => {
            if let Err(e) = res {
                warn!("HTTP server task ended: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    Ok(())
}
