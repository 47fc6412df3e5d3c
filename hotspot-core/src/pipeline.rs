use crate::config::DetectorConfig;
use crate::error::{HotspotError, Result};
use crate::hotspot::{build_hotspots, Hotspot};
use crate::image_preparer::PreparedImage;
use crate::labeler::order_and_label;
use crate::parser::parse_points;
use crate::store::{validate_session_id, HotspotStore};
use crate::vision::ModelInvoker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// How a detection run ended. Every outcome other than `Detected` comes
/// with an empty hotspot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOutcome {
    Detected,
    /// Source image could not be opened or processed
    DecodeFailure,
    /// Primary and backup model calls both failed
    ModelUnavailable,
    /// A model answered with no text
    EmptyResponse,
    /// The answer contained no coordinate pairs
    NoPointsFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub hotspots: Vec<Hotspot>,
    pub outcome: DetectionOutcome,
    pub execution_time_ms: u128,
}

impl DetectionReport {
    fn empty(outcome: DetectionOutcome, started: Instant) -> Self {
        Self {
            hotspots: Vec::new(),
            outcome,
            execution_time_ms: started.elapsed().as_millis(),
        }
    }
}

/// Parse, order, label and map model output into hotspots
pub fn hotspots_from_text(text: &str) -> Vec<Hotspot> {
    let points = parse_points(text);
    let labeled = order_and_label(points);
    build_hotspots(&labeled)
}

/// Runs image preparation, the model call and hotspot extraction in sequence
pub struct HotspotDetector {
    invoker: ModelInvoker,
    max_dimension: u32,
}

impl HotspotDetector {
    pub fn new(invoker: ModelInvoker, max_dimension: u32) -> Self {
        Self {
            invoker,
            max_dimension,
        }
    }

    /// Detector talking to the configured OpenAI-compatible endpoint
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        Ok(Self::new(config.build_invoker()?, config.max_dimension))
    }

    /// Full pipeline; recoverable failures give an empty list
    pub async fn detect(&self, image_bytes: &[u8], prompt: &str) -> Vec<Hotspot> {
        self.detect_report(image_bytes, prompt).await.hotspots
    }

    /// Full pipeline, reporting which way an empty result came about
    pub async fn detect_report(&self, image_bytes: &[u8], prompt: &str) -> DetectionReport {
        let started = Instant::now();
        info!("Analyzing panorama ({} bytes)", image_bytes.len());

        let image = match self.prepare(image_bytes).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Detection aborted, decode failure: {}", e);
                return DetectionReport::empty(DetectionOutcome::DecodeFailure, started);
            }
        };
        info!(
            "Resized for model: {}x{} -> {}x{}",
            image.original_width, image.original_height, image.width, image.height
        );

        let text = match self.invoker.try_invoke(&image, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Detection aborted, model unavailable: {}", e);
                return DetectionReport::empty(DetectionOutcome::ModelUnavailable, started);
            }
        };

        if text.trim().is_empty() {
            warn!("No response text from model");
            return DetectionReport::empty(DetectionOutcome::EmptyResponse, started);
        }

        let hotspots = hotspots_from_text(&text);
        if hotspots.is_empty() {
            warn!("No coordinate pairs found in model response ({} chars)", text.len());
            return DetectionReport::empty(DetectionOutcome::NoPointsFound, started);
        }

        info!("Found {} hotspot points", hotspots.len());
        DetectionReport {
            hotspots,
            outcome: DetectionOutcome::Detected,
            execution_time_ms: started.elapsed().as_millis(),
        }
    }

    /// Detect and persist under `session_id`. Nothing is written unless at
    /// least one hotspot was found; storage failures propagate.
    pub async fn detect_and_store(
        &self,
        store: Arc<dyn HotspotStore>,
        session_id: &str,
        image_bytes: &[u8],
        prompt: &str,
    ) -> Result<DetectionReport> {
        validate_session_id(session_id)?;

        let report = self.detect_report(image_bytes, prompt).await;
        if report.outcome == DetectionOutcome::Detected {
            let id = session_id.to_string();
            let hotspots = report.hotspots.clone();
            tokio::task::spawn_blocking(move || store.save(&id, &hotspots))
                .await
                .map_err(join_error)??;
        } else {
            info!("Nothing persisted for session {} ({:?})", session_id, report.outcome);
        }

        Ok(report)
    }

    async fn prepare(&self, image_bytes: &[u8]) -> Result<PreparedImage> {
        // CPU-bound decode runs on the blocking pool
        let bytes = image_bytes.to_vec();
        let max_dimension = self.max_dimension;

        tokio::task::spawn_blocking(move || PreparedImage::from_bytes_bounded(&bytes, max_dimension))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> HotspotError {
    HotspotError::IoError(std::io::Error::other(e.to_string()))
}

/// Stored hotspots for a session, empty if none were ever saved
pub fn load_hotspots(store: &dyn HotspotStore, session_id: &str) -> Result<Vec<Hotspot>> {
    store.load(session_id)
}

/// Replace the stored hotspots for a session with an edited list
pub fn save_hotspots(store: &dyn HotspotStore, session_id: &str, hotspots: &[Hotspot]) -> Result<()> {
    info!("Saving {} edited hotspots for session {}", hotspots.len(), session_id);
    store.save(session_id, hotspots)
}
