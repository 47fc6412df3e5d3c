//! Turns a vision model's free-form answer about a 360° panorama into an
//! ordered, labeled set of spherical hotspots, and persists that set per
//! panorama session.
//!
//! image -> [`image_preparer`] -> [`vision`] -> text -> [`parser`] ->
//! [`labeler`] -> [`mapper`] -> [`store`]

pub mod config;
pub mod error;
pub mod hotspot;
pub mod image_preparer;
pub mod labeler;
pub mod mapper;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod store;
pub mod vision;

#[cfg(test)]
mod test_utils;

pub use config::DetectorConfig;
pub use error::{HotspotError, Result};
pub use hotspot::Hotspot;
pub use image_preparer::PreparedImage;
pub use parser::NormalizedPoint;
pub use pipeline::{
    hotspots_from_text, load_hotspots, save_hotspots, DetectionOutcome, DetectionReport,
    HotspotDetector,
};
pub use prompt::DEFAULT_PROMPT;
pub use store::{new_session_id, HotspotStore, JsonFileStore, MemoryStore};
pub use vision::{ModelInvoker, OpenAiVisionModel, VisionModel};
