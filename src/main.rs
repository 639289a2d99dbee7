use std::sync::Arc;

use tracing::info;

use roombook::compactor;
use roombook::config::Config;
use roombook::engine::Engine;
use roombook::http::server::shutdown_signal;
use roombook::http::{AppState, HttpServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    roombook::observability::init_tracing();

    let config = Config::from_env();
    roombook::observability::init_metrics(config.metrics_port)?;

    let engine = match (&config.data_dir, config.wal_path()) {
        (Some(data_dir), Some(wal_path)) => {
            std::fs::create_dir_all(data_dir)?;
            let engine = Arc::new(Engine::open(wal_path)?);
            let compactor_engine = engine.clone();
            let threshold = config.compact_threshold;
            tokio::spawn(async move {
                compactor::run_compactor(compactor_engine, threshold).await;
            });
            engine
        }
        _ => Arc::new(Engine::in_memory()),
    };

    info!(
        "  data_dir: {}",
        config
            .data_dir
            .as_ref()
            .map_or("in-memory".to_string(), |d| d.display().to_string())
    );
    info!("  compact_threshold: {}", config.compact_threshold);
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let server = HttpServer::new(config.socket_addr(), AppState::new(engine));
    server.start(shutdown_signal()).await?;

    info!("roombook stopped");
    Ok(())
}
