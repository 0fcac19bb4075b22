//! Renderer trait abstraction.

use doodlepost_core::drawing::DrawingState;
use kurbo::Size;
use thiserror::Error;
use tiny_skia::Pixmap;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid render size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single interactive frame.
///
/// The canvas size is the one recorded in the drawing, so gestures and
/// exports always see the size that was last rendered.
pub struct RenderContext<'a> {
    /// The drawing to render.
    pub drawing: &'a DrawingState,
    /// Device pixels per logical point.
    pub pixel_ratio: f64,
    /// Whether the photo-positioning hint may be shown.
    pub show_hint: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(drawing: &'a DrawingState) -> Self {
        Self {
            drawing,
            pixel_ratio: 1.0,
            show_hint: true,
        }
    }

    /// Set the pixel ratio for HiDPI.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Canvas size in logical points, if one has been recorded.
    pub fn canvas_size(&self) -> Option<Size> {
        self.drawing.canvas_size()
    }

    /// Enable or disable the hint label.
    pub fn with_hint(mut self, show_hint: bool) -> Self {
        self.show_hint = show_hint;
        self
    }
}

/// A rendered interactive frame.
pub struct Frame {
    /// The composited canvas in device pixels.
    pub pixmap: Pixmap,
    /// Label for the host to draw centered over the canvas.
    pub hint: Option<String>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

/// An exported doodle.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Trait for rendering backends.
pub trait Renderer: Send {
    /// Render the canvas as the user sees it while drawing.
    ///
    /// Fails with [`RendererError::InvalidSize`] if no canvas size has been
    /// recorded.
    fn render_interactive(&mut self, ctx: &RenderContext) -> RenderResult<Frame>;

    /// Record the on-screen canvas size in the drawing, then render it.
    ///
    /// This is the per-frame entry point for hosts: gesture clamping and
    /// export rescaling both read the size recorded here.
    fn render_frame(
        &mut self,
        drawing: &mut DrawingState,
        canvas_size: Size,
        pixel_ratio: f64,
    ) -> RenderResult<Frame> {
        drawing.set_canvas_size(canvas_size);
        self.render_interactive(&RenderContext::new(drawing).with_pixel_ratio(pixel_ratio))
    }

    /// Render the doodle for sending at `target` logical size.
    ///
    /// Strokes and the photo offset are rescaled from the canvas size recorded
    /// in the drawing. Output is at the export pixel ratio.
    fn render_export(&mut self, drawing: &DrawingState, target: Size) -> RenderResult<ExportedImage>;
}
