//! Decoded background photo placed behind the strokes.

use kurbo::Size;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while decoding a background image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image has zero size")]
    Empty,
}

/// Source format of a background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }

    fn as_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// A decoded background image in straight (non-premultiplied) RGBA8.
///
/// Pixel data is shared, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    id: Uuid,
    width: u32,
    height: u32,
    format: ImageFormat,
    rgba: Arc<Vec<u8>>,
}

impl PartialEq for BackgroundImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl BackgroundImage {
    /// Decode image bytes (PNG, JPEG or WebP).
    pub fn decode(data: &[u8]) -> Result<Self, ImageError> {
        let format = ImageFormat::from_magic_bytes(data).ok_or(ImageError::UnsupportedFormat)?;
        let decoded = image::load_from_memory_with_format(data, format.as_image_format())
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw(), format)
    }

    /// Wrap already-decoded RGBA8 pixels.
    pub fn from_rgba(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        format: ImageFormat,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ImageError::Decode(format!(
                "expected {} bytes of RGBA data, got {}",
                expected,
                rgba.len()
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            width,
            height,
            format,
            rgba: Arc::new(rgba),
        })
    }

    /// Identity of this decoded image (stable across clones).
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Straight-alpha RGBA8 pixels, row-major.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Intrinsic size in pixels.
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}
