use anyhow::Context;
use hotspot_core::{DetectorConfig, HotspotDetector, JsonFileStore};
use hotspot_server::{create_app, AppState, ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Panorama Hotspot Server");

    let config = ServerConfig::from_env();
    let detector_config = DetectorConfig::from_env()?;

    let detector = match HotspotDetector::from_config(&detector_config) {
        Ok(detector) => {
            info!(
                "Detection enabled (model: {}, backup: {})",
                detector_config.primary_model,
                detector_config.backup_model.as_deref().unwrap_or("none")
            );
            Some(Arc::new(detector))
        }
        Err(e) => {
            warn!("Detection disabled: {}", e);
            None
        }
    };

    info!("Hotspot data in {}", config.data_dir.display());
    let state = AppState {
        store: Arc::new(JsonFileStore::new(&config.data_dir)),
        detector,
        upload_dir: config.upload_dir.clone(),
    };

    let app = create_app(state);

    info!("Server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
