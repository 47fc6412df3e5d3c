use crate::labeler::LabeledPoint;
use crate::mapper::to_spherical;
use serde::{Deserialize, Serialize};

/// A labeled point of interest on a panorama, as persisted and served to viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Position in the left-to-right ordering at detection time
    pub id: String,
    pub label: String,
    pub yaw: f64,
    pub pitch: f64,
    /// Normalized model coordinates the angles were derived from
    pub y_norm: f64,
    pub x_norm: f64,
}

impl From<&LabeledPoint> for Hotspot {
    fn from(labeled: &LabeledPoint) -> Self {
        let angles = to_spherical(labeled.point);
        Hotspot {
            id: labeled.index.to_string(),
            label: labeled.label.clone(),
            yaw: angles.yaw,
            pitch: angles.pitch,
            y_norm: labeled.point.y,
            x_norm: labeled.point.x,
        }
    }
}

/// Convert ordered, labeled points into hotspot records
pub fn build_hotspots(points: &[LabeledPoint]) -> Vec<Hotspot> {
    points.iter().map(Hotspot::from).collect()
}
