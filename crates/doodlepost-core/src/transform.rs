//! Background image transform and the clamp that keeps the canvas covered.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed image zoom (the image exactly fills the canvas).
pub const MIN_IMAGE_SCALE: f64 = 1.0;
/// Largest allowed image zoom.
pub const MAX_IMAGE_SCALE: f64 = 3.0;

/// Scale and offset applied to the background image.
///
/// The offset is measured from the centered position, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    /// Zoom relative to the fill size.
    pub scale: f64,
    /// Translation away from the centered position.
    pub offset: Vec2,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            scale: MIN_IMAGE_SCALE,
            offset: Vec2::ZERO,
        }
    }
}

/// Clamp a scale into the allowed zoom range.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return MIN_IMAGE_SCALE;
    }
    scale.clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE)
}

/// Rendered image size under the fill policy.
///
/// The image always covers the canvas: the narrower dimension is clipped,
/// never letterboxed.
pub fn fill_size(image_size: Size, canvas_size: Size, scale: f64) -> Size {
    if is_degenerate(image_size) || is_degenerate(canvas_size) {
        return Size::ZERO;
    }

    let image_aspect = image_size.width / image_size.height;
    let canvas_aspect = canvas_size.width / canvas_size.height;

    if image_aspect > canvas_aspect {
        let height = canvas_size.height * scale;
        Size::new(height * image_aspect, height)
    } else {
        let width = canvas_size.width * scale;
        Size::new(width, width / image_aspect)
    }
}

/// Largest offset along each axis that still keeps the canvas covered.
pub fn max_offset(image_size: Size, canvas_size: Size, scale: f64) -> Vec2 {
    let rendered = fill_size(image_size, canvas_size, scale);
    if rendered == Size::ZERO {
        return Vec2::ZERO;
    }
    Vec2::new(
        ((rendered.width - canvas_size.width) / 2.0).max(0.0),
        ((rendered.height - canvas_size.height) / 2.0).max(0.0),
    )
}

fn is_degenerate(size: Size) -> bool {
    !(size.width > 0.0 && size.height > 0.0 && size.is_finite())
}

impl ImageTransform {
    pub fn new(scale: f64, offset: Vec2) -> Self {
        Self { scale, offset }
    }

    /// Project this transform onto the allowed set.
    ///
    /// Scale is clamped to [`MIN_IMAGE_SCALE`, `MAX_IMAGE_SCALE`] and each
    /// offset axis to `[-max, +max]`. Applying it twice gives the same result
    /// as applying it once.
    pub fn clamped(&self, image_size: Size, canvas_size: Size) -> Self {
        let scale = clamp_scale(self.scale);
        let max = max_offset(image_size, canvas_size, scale);
        let clamp_axis = |value: f64, limit: f64| {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(-limit, limit)
            }
        };
        Self {
            scale,
            offset: Vec2::new(
                clamp_axis(self.offset.x, max.x),
                clamp_axis(self.offset.y, max.y),
            ),
        }
    }

    /// Destination rectangle of the image inside the canvas.
    ///
    /// May extend past the canvas edges; renderers clip to the canvas.
    pub fn image_rect(&self, image_size: Size, canvas_size: Size) -> Rect {
        let rendered = fill_size(image_size, canvas_size, self.scale);
        let origin = Point::new(
            (canvas_size.width - rendered.width) / 2.0 + self.offset.x,
            (canvas_size.height - rendered.height) / 2.0 + self.offset.y,
        );
        Rect::from_origin_size(origin, rendered)
    }

    /// Copy with the offset scaled per axis (used when exporting at a
    /// different size than the canvas).
    pub fn with_scaled_offset(&self, scale_x: f64, scale_y: f64) -> Self {
        Self {
            scale: self.scale,
            offset: Vec2::new(self.offset.x * scale_x, self.offset.y * scale_y),
        }
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
