use crate::parser::NormalizedPoint;
use tracing::warn;

/// Side length of the model's normalized coordinate space
pub const NORMALIZED_SIZE: f64 = 1000.0;

/// Spherical viewing angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalAngles {
    /// -180 (left edge) .. 180 (right edge)
    pub yaw: f64,
    /// 90 (image top, straight up) .. -90 (image bottom)
    pub pitch: f64,
}

/// Map a normalized equirectangular point to yaw/pitch, rounded to 2 decimals.
///
/// Values outside 0-1000 are not clamped and produce angles outside the
/// nominal ranges.
pub fn to_spherical(point: NormalizedPoint) -> SphericalAngles {
    if !is_within_bounds(point) {
        warn!(
            "Point [{}, {}] outside normalized range, mapping without clamping",
            point.y, point.x
        );
    }

    let yaw = (point.x / NORMALIZED_SIZE) * 360.0 - 180.0;
    let pitch = 90.0 - (point.y / NORMALIZED_SIZE) * 180.0;

    SphericalAngles {
        yaw: round2(yaw),
        pitch: round2(pitch),
    }
}

/// Round to two decimal places, ties to even.
///
/// Rounds the exact binary value rather than `value * 100`, which can land
/// on a false tie.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

pub fn is_within_bounds(point: NormalizedPoint) -> bool {
    (0.0..=NORMALIZED_SIZE).contains(&point.x) && (0.0..=NORMALIZED_SIZE).contains(&point.y)
}
