//! Export geometry: maps a drawing made on the on-screen canvas onto an
//! output image of arbitrary logical size.

use crate::background::BackgroundImage;
use crate::color::Rgba;
use crate::drawing::DrawingState;
use crate::stroke::Stroke;
use crate::transform::ImageTransform;
use kurbo::Size;

/// Output pixels per logical point for exported images.
pub const EXPORT_PIXEL_RATIO: f64 = 2.0;

/// Everything a renderer needs to composite an exported doodle.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    /// Logical output size.
    pub target_size: Size,
    /// Horizontal scale from canvas to output.
    pub scale_x: f64,
    /// Vertical scale from canvas to output.
    pub scale_y: f64,
    pub background_color: Rgba,
    pub background_image: Option<BackgroundImage>,
    /// Photo transform with the offset already rescaled.
    pub image_transform: ImageTransform,
    /// Rescaled strokes in paint order.
    pub strokes: Vec<Stroke>,
}

impl ExportPlan {
    /// Plan an export of `drawing` at `target_size`.
    ///
    /// Coordinates are rescaled from the canvas size recorded during drawing.
    /// Without a recorded size the drawing is assumed to already be in output
    /// coordinates.
    pub fn new(drawing: &DrawingState, target_size: Size) -> Self {
        let canvas_size = drawing
            .canvas_size()
            .filter(|size| size.width > 0.0 && size.height > 0.0)
            .unwrap_or(target_size);
        let scale_x = target_size.width / canvas_size.width;
        let scale_y = target_size.height / canvas_size.height;

        let strokes = drawing
            .paths()
            .iter()
            .chain(drawing.current_path().filter(|s| s.is_committable()))
            .map(|stroke| stroke.scaled(scale_x, scale_y))
            .collect();

        Self {
            target_size,
            scale_x,
            scale_y,
            background_color: drawing.background_color(),
            background_image: drawing.background_image().cloned(),
            image_transform: drawing.image_transform().with_scaled_offset(scale_x, scale_y),
            strokes,
        }
    }
}

/// Raster size in pixels of a `logical` size at `pixel_ratio`.
///
/// Returns `None` unless both dimensions round to at least one pixel and fit
/// in a `u32`.
pub fn pixel_size(logical: Size, pixel_ratio: f64) -> Option<(u32, u32)> {
    if !(pixel_ratio.is_finite() && pixel_ratio > 0.0 && logical.is_finite()) {
        return None;
    }
    let width = (logical.width * pixel_ratio).round();
    let height = (logical.height * pixel_ratio).round();
    let in_range = |v: f64| (1.0..=u32::MAX as f64).contains(&v);
    if !(in_range(width) && in_range(height)) {
        return None;
    }
    Some((width as u32, height as u32))
}
