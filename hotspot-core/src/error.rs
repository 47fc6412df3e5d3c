use image::ImageError;

/// Error types for the hotspot pipeline and store
#[derive(Debug)]
pub enum HotspotError {
    /// Source panorama could not be decoded
    Decode(ImageError),
    /// Prepared copy could not be re-encoded for transmission
    Encode(ImageError),
    /// A single vision model call failed
    Model(String),
    /// Primary and backup model calls both failed
    ModelUnavailable {
        primary: String,
        backup: Option<String>,
    },
    /// Stored record exists but cannot be used
    Storage(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    InvalidSessionId(String),
    Config(String),
}

impl std::fmt::Display for HotspotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HotspotError::Decode(e) => write!(f, "Image decode error: {}", e),
            HotspotError::Encode(e) => write!(f, "Image encode error: {}", e),
            HotspotError::Model(msg) => write!(f, "Vision model error: {}", msg),
            HotspotError::ModelUnavailable { primary, backup } => match backup {
                Some(backup) => write!(
                    f,
                    "Vision models unavailable (primary: {}; backup: {})",
                    primary, backup
                ),
                None => write!(f, "Vision model unavailable: {}", primary),
            },
            HotspotError::Storage(msg) => write!(f, "Storage error: {}", msg),
            HotspotError::IoError(e) => write!(f, "IO error: {}", e),
            HotspotError::JsonError(e) => write!(f, "JSON error: {}", e),
            HotspotError::InvalidSessionId(id) => write!(f, "Invalid session id: {:?}", id),
            HotspotError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for HotspotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HotspotError::Decode(e) | HotspotError::Encode(e) => Some(e),
            HotspotError::IoError(e) => Some(e),
            HotspotError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HotspotError {
    fn from(err: std::io::Error) -> Self {
        HotspotError::IoError(err)
    }
}

impl From<serde_json::Error> for HotspotError {
    fn from(err: serde_json::Error) -> Self {
        HotspotError::JsonError(err)
    }
}

impl From<reqwest::Error> for HotspotError {
    fn from(err: reqwest::Error) -> Self {
        HotspotError::Model(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HotspotError>;
