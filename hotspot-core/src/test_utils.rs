use crate::error::{HotspotError, Result};
use crate::image_preparer::PreparedImage;
use crate::vision::VisionModel;
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Vision model that replays a fixed answer and counts calls
pub(crate) struct ScriptedModel {
    name: String,
    reply: std::result::Result<String, String>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub(crate) fn ok(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: Ok(text.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: Err(message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _image: &PreparedImage, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(HotspotError::Model)
    }
}

/// Already-prepared image that never touches the decoder
pub(crate) fn tiny_image() -> PreparedImage {
    PreparedImage {
        jpeg_bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
        original_width: 2,
        original_height: 1,
        width: 2,
        height: 1,
    }
}

/// Encoded PNG panorama of the given size
pub(crate) fn panorama_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([90u8, 130u8, 180u8]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
