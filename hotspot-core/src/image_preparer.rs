use crate::error::{HotspotError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Longest side of the copy sent to the vision model
pub const MAX_DIMENSION: u32 = 2048;

/// JPEG quality used for the transmitted copy
pub const JPEG_QUALITY: u8 = 90;

/// Downscaled working copy of a panorama, encoded for transmission
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// JPEG-encoded working copy
    pub jpeg_bytes: Vec<u8>,
    /// Source dimensions (width, height)
    pub original_width: u32,
    pub original_height: u32,
    /// Working copy dimensions (width, height)
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    /// Prepare an image from encoded bytes using the default size cap
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_bounded(bytes, MAX_DIMENSION)
    }

    /// Prepare an image from encoded bytes, bounding the longest side to `max_dimension`.
    ///
    /// Decoder allocation limits are lifted so very large panoramas load.
    /// Images already within the bound are re-encoded at their own size.
    pub fn from_bytes_bounded(bytes: &[u8], max_dimension: u32) -> Result<Self> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(HotspotError::IoError)?;
        reader.no_limits();

        let img = reader.decode().map_err(HotspotError::Decode)?;
        Self::from_image(&img, max_dimension)
    }

    /// Prepare an image read from disk
    pub fn from_path(path: &Path, max_dimension: u32) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes_bounded(&bytes, max_dimension)
    }

    fn from_image(img: &DynamicImage, max_dimension: u32) -> Result<Self> {
        let original_width = img.width();
        let original_height = img.height();
        let (width, height) = fit_within(original_width, original_height, max_dimension);

        let working = if (width, height) == (original_width, original_height) {
            img.to_rgb8()
        } else {
            img.resize_exact(width, height, image::imageops::FilterType::Lanczos3)
                .to_rgb8()
        };

        let mut jpeg_bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg_bytes, JPEG_QUALITY)
            .encode_image(&working)
            .map_err(HotspotError::Encode)?;

        debug!(
            "Prepared {}x{} -> {}x{} ({} bytes)",
            original_width,
            original_height,
            width,
            height,
            jpeg_bytes.len()
        );

        Ok(PreparedImage {
            jpeg_bytes,
            original_width,
            original_height,
            width,
            height,
        })
    }

    pub fn was_downscaled(&self) -> bool {
        self.width != self.original_width || self.height != self.original_height
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg_bytes)
    }

    /// Get the base64 data URL for use with vision APIs
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.to_base64())
    }
}

/// Dimensions that fit `(width, height)` inside a `max_dimension` square,
/// preserving aspect ratio. Never enlarges.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }

    let scale = max_dimension as f64 / longest as f64;
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);

    (new_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::panorama_png as png_bytes;

    #[test]
    fn test_fit_within_wide_panorama() {
        assert_eq!(fit_within(8192, 4096, 2048), (2048, 1024));
        assert_eq!(fit_within(3000, 1500, 2048), (2048, 1024));
    }

    #[test]
    fn test_fit_within_portrait() {
        assert_eq!(fit_within(1000, 4000, 2048), (512, 2048));
    }

    #[test]
    fn test_fit_within_never_enlarges() {
        assert_eq!(fit_within(640, 320, 2048), (640, 320));
        assert_eq!(fit_within(2048, 2048, 2048), (2048, 2048));
    }

    #[test]
    fn test_fit_within_extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within(100_000, 10, 2048), (2048, 1));
    }

    #[test]
    fn test_prepare_downscales_preserving_aspect() {
        let bytes = png_bytes(600, 300);

        let prepared = PreparedImage::from_bytes_bounded(&bytes, 256).unwrap();

        assert_eq!(prepared.original_width, 600);
        assert_eq!(prepared.original_height, 300);
        assert_eq!((prepared.width, prepared.height), (256, 128));
        assert!(prepared.was_downscaled());

        // Working copy decodes back at the bounded size
        let decoded = image::load_from_memory(&prepared.jpeg_bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 128));
    }

    #[test]
    fn test_prepare_small_image_unchanged_size() {
        let bytes = png_bytes(120, 60);

        let prepared = PreparedImage::from_bytes(&bytes).unwrap();

        assert_eq!((prepared.width, prepared.height), (120, 60));
        assert!(!prepared.was_downscaled());
    }

    #[test]
    fn test_prepare_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pano.png");
        std::fs::write(&path, png_bytes(400, 100)).unwrap();

        let prepared = PreparedImage::from_path(&path, 200).unwrap();
        assert_eq!((prepared.width, prepared.height), (200, 50));

        assert!(PreparedImage::from_path(&dir.path().join("missing.png"), 200).is_err());
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let result = PreparedImage::from_bytes(b"definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn test_data_url_format() {
        let prepared = PreparedImage::from_bytes(&png_bytes(32, 16)).unwrap();

        assert!(!prepared.to_base64().is_empty());
        assert!(prepared.to_data_url().starts_with("data:image/jpeg;base64,"));
    }
}
