mod action;
mod app;
mod theme;

use std::path::Path;
use std::sync::Arc;

use mood_client::client::HttpPlaylistClient;
use mood_client::presentation::SessionUpdate;
use mood_client::replay::SAMPLE_SCRIPT;
use mood_proto::config::Config;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = mood_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("moodplay.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Keep HTTP client internals quiet unless RUST_LOG asks otherwise
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("moodplay log: {}", log_path.display());
    tracing::info!("moodplay starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_default();

    // Seed the bundled replay script on first run, only at the default path
    let default_script = data_dir.join("detections.json");
    if Path::new(&config.model.source_uri) == default_script.as_path() && !default_script.exists() {
        match std::fs::write(&default_script, SAMPLE_SCRIPT) {
            Ok(()) => tracing::info!("Seeded detection script at {:?}", default_script),
            Err(e) => tracing::warn!("Could not seed detection script: {}", e),
        }
    }

    // ── Playlist backend + update channel (session → TUI) ────────────────────
    let backend = Arc::new(HttpPlaylistClient::new(&config.backend)?);
    tracing::info!("Playlist endpoint: {}", backend.endpoint());
    let (update_tx, _) = broadcast::channel::<SessionUpdate>(256);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(config, backend, update_tx);
    app.run().await?;

    Ok(())
}
