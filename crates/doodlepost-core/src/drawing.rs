//! Drawing state: finalized strokes, the stroke in progress, undo history and
//! background settings for one doodle.

use crate::background::BackgroundImage;
use crate::color::Rgba;
use crate::config::DrawingConfig;
use crate::stroke::{Stroke, StrokeId};
use crate::transform::{ImageTransform, clamp_scale};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest stroke width accepted from the width picker.
const MIN_LINE_WIDTH: f64 = 0.5;

/// Errors from drawing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawingError {
    #[error("A stroke is already in progress")]
    PathInProgress,
}

/// Active drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

/// Serializable part of a drawing (everything except the decoded photo).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DrawingSnapshot {
    paths: Vec<Stroke>,
    background_color: Rgba,
    image_transform: ImageTransform,
    canvas_size: Option<Size>,
}

/// The single owner of all mutable drawing data for one doodle.
#[derive(Debug, Clone)]
pub struct DrawingState {
    config: DrawingConfig,
    paths: Vec<Stroke>,
    current_path: Option<Stroke>,
    undo_stack: Vec<Stroke>,
    selected_color: Rgba,
    selected_tool: Tool,
    line_width: f64,
    background_color: Rgba,
    background_image: Option<BackgroundImage>,
    image_transform: ImageTransform,
    canvas_size: Option<Size>,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self::new(DrawingConfig::default())
    }
}

impl DrawingState {
    /// Create an empty drawing using the given configuration.
    pub fn new(config: DrawingConfig) -> Self {
        Self {
            paths: Vec::new(),
            current_path: None,
            undo_stack: Vec::new(),
            selected_color: config.default_color,
            selected_tool: Tool::Pen,
            line_width: config.default_line_width,
            background_color: config.background_color,
            background_image: None,
            image_transform: ImageTransform::default(),
            canvas_size: None,
            config,
        }
    }

    pub fn config(&self) -> &DrawingConfig {
        &self.config
    }

    // --- strokes -------------------------------------------------------

    /// Begin a stroke at `point` using the current tool, color and width.
    ///
    /// Eraser strokes use the erase color and a wider brush. Fails without
    /// touching the open stroke if one is already in progress.
    pub fn start_path(&mut self, point: Point) -> Result<(), DrawingError> {
        if self.current_path.is_some() {
            return Err(DrawingError::PathInProgress);
        }

        let stroke = match self.selected_tool {
            Tool::Pen => Stroke::new(point, self.selected_color, self.line_width, false),
            Tool::Eraser => Stroke::new(
                point,
                self.erase_color(),
                self.line_width * self.config.eraser_width_multiplier,
                true,
            ),
        };
        log::debug!("Stroke {} started at ({:.1}, {:.1})", stroke.id(), point.x, point.y);
        self.current_path = Some(stroke);
        Ok(())
    }

    /// Append a point to the open stroke, if any.
    pub fn add_point(&mut self, point: Point) {
        if let Some(stroke) = &mut self.current_path {
            stroke.add_point(point);
        }
    }

    /// Finish the open stroke.
    ///
    /// Strokes with fewer than two points are discarded. Committing a stroke
    /// clears the redo history. Returns the id of the committed stroke.
    pub fn end_path(&mut self) -> Option<StrokeId> {
        let stroke = self.current_path.take()?;
        if !stroke.is_committable() {
            log::debug!("Discarding stroke {} with {} point(s)", stroke.id(), stroke.len());
            return None;
        }

        let id = stroke.id();
        self.paths.push(stroke);
        self.undo_stack.clear();
        Some(id)
    }

    /// Drop the open stroke without committing it.
    pub fn cancel_path(&mut self) {
        if let Some(stroke) = self.current_path.take() {
            log::debug!("Cancelled stroke {}", stroke.id());
        }
    }

    /// Move the last stroke onto the undo stack.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.paths.pop() {
            Some(stroke) => {
                self.undo_stack.push(stroke);
                true
            }
            None => false,
        }
    }

    /// Restore the most recently undone stroke.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(stroke) => {
                self.paths.push(stroke);
                true
            }
            None => false,
        }
    }

    /// Start over: removes strokes and the photo but keeps the canvas color.
    pub fn clear(&mut self) {
        self.clear_drawing_only();
        self.background_image = None;
        self.image_transform.reset();
    }

    /// Return to a pristine session, including a white canvas.
    pub fn clear_all(&mut self) {
        self.clear();
        self.background_color = Rgba::white();
    }

    /// Remove strokes and history, keeping the photo and canvas color.
    pub fn clear_drawing_only(&mut self) {
        self.paths.clear();
        self.current_path = None;
        self.undo_stack.clear();
    }

    // --- queries -------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        !self.paths.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Nothing drawn, nothing in progress and no photo.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.current_path.is_none() && self.background_image.is_none()
    }

    /// Whether the photo-positioning hint should be shown.
    pub fn show_transform_hint(&self) -> bool {
        self.background_image.is_some() && self.paths.is_empty() && self.current_path.is_none()
    }

    /// Finalized strokes, oldest first.
    pub fn paths(&self) -> &[Stroke] {
        &self.paths
    }

    pub fn current_path(&self) -> Option<&Stroke> {
        self.current_path.as_ref()
    }

    pub fn undo_stack(&self) -> &[Stroke] {
        &self.undo_stack
    }

    pub fn is_drawing(&self) -> bool {
        self.current_path.is_some()
    }

    // --- stroke configuration ---------------------------------------------

    pub fn selected_color(&self) -> Rgba {
        self.selected_color
    }

    /// Select the pen color. An open stroke keeps the color it started with.
    pub fn set_color(&mut self, color: Rgba) {
        self.selected_color = color;
    }

    pub fn selected_tool(&self) -> Tool {
        self.selected_tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.selected_tool = tool;
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    /// Set the stroke width, never below a visible minimum.
    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = if width.is_finite() {
            width.max(MIN_LINE_WIDTH)
        } else {
            self.config.default_line_width
        };
    }

    /// Color painted by eraser strokes.
    pub fn erase_color(&self) -> Rgba {
        self.background_color
    }

    // --- background ------------------------------------------------------

    pub fn background_color(&self) -> Rgba {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Rgba) {
        self.background_color = color;
    }

    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    /// Place a photo behind the strokes, resetting its transform.
    pub fn set_background_image(&mut self, image: BackgroundImage) {
        log::debug!("Background image set ({}x{})", image.width(), image.height());
        self.background_image = Some(image);
        self.image_transform.reset();
    }

    pub fn remove_background_image(&mut self) {
        self.background_image = None;
        self.image_transform.reset();
    }

    pub fn image_transform(&self) -> ImageTransform {
        self.image_transform
    }

    pub fn image_scale(&self) -> f64 {
        self.image_transform.scale
    }

    pub fn image_offset(&self) -> Vec2 {
        self.image_transform.offset
    }

    /// Set the photo zoom, clamped to the allowed range.
    pub fn set_image_scale(&mut self, scale: f64) {
        self.image_transform.scale = clamp_scale(scale);
    }

    /// Set the photo offset. Call [`Self::clamp_image_transform`] once the
    /// gesture settles.
    pub fn set_image_offset(&mut self, offset: Vec2) {
        self.image_transform.offset = offset;
    }

    /// Pull the photo transform back so the canvas is fully covered.
    pub fn clamp_image_transform(&mut self) -> ImageTransform {
        let image_size = self
            .background_image
            .as_ref()
            .map(BackgroundImage::size)
            .unwrap_or(Size::ZERO);
        let canvas_size = self.canvas_size.unwrap_or(Size::ZERO);
        self.image_transform = self.image_transform.clamped(image_size, canvas_size);
        self.image_transform
    }

    // --- geometry ------------------------------------------------------

    /// On-screen canvas size recorded at the last interactive render.
    pub fn canvas_size(&self) -> Option<Size> {
        self.canvas_size
    }

    pub fn set_canvas_size(&mut self, size: Size) {
        if self.canvas_size == Some(size) {
            return;
        }
        self.canvas_size = Some(size);
        if self.background_image.is_some() {
            self.clamp_image_transform();
        }
    }

    // --- persistence ---------------------------------------------------

    /// Serialize strokes, canvas color and photo transform to JSON.
    ///
    /// The photo itself is not included.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let snapshot = DrawingSnapshot {
            paths: self.paths.clone(),
            background_color: self.background_color,
            image_transform: self.image_transform,
            canvas_size: self.canvas_size,
        };
        serde_json::to_string_pretty(&snapshot)
    }

    /// Restore a drawing saved with [`Self::to_json`].
    pub fn from_json(json: &str, config: DrawingConfig) -> Result<Self, serde_json::Error> {
        let snapshot: DrawingSnapshot = serde_json::from_str(json)?;
        let mut state = Self::new(config);
        state.paths = snapshot
            .paths
            .into_iter()
            .filter(Stroke::is_committable)
            .collect();
        state.background_color = snapshot.background_color;
        state.image_transform = snapshot.image_transform;
        state.canvas_size = snapshot.canvas_size;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::ImageFormat;

    fn draw(state: &mut DrawingState, points: &[(f64, f64)]) -> Option<StrokeId> {
        let (first, rest) = points.split_first()?;
        state.start_path(Point::new(first.0, first.1)).unwrap();
        for &(x, y) in rest {
            state.add_point(Point::new(x, y));
        }
        state.end_path()
    }

    fn photo() -> BackgroundImage {
        BackgroundImage::from_rgba(4, 3, vec![128; 48], ImageFormat::Png).unwrap()
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = DrawingState::default();
        assert!(state.is_empty());
        assert!(!state.can_undo());
        assert!(!state.can_redo());
        assert_eq!(state.background_color(), Rgba::white());
    }

    #[test]
    fn test_single_point_stroke_is_discarded() {
        let mut state = DrawingState::default();
        state.start_path(Point::new(5.0, 5.0)).unwrap();
        assert!(state.end_path().is_none());
        assert!(state.paths().is_empty());
        assert!(state.current_path().is_none());
    }

    #[test]
    fn test_commit_stroke() {
        let mut state = DrawingState::default();
        let id = draw(&mut state, &[(0.0, 0.0), (10.0, 10.0)]).unwrap();
        assert_eq!(state.paths().len(), 1);
        assert_eq!(state.paths()[0].id(), id);
        assert!(state.can_undo());
        assert!(!state.is_empty());
    }

    #[test]
    fn test_add_point_without_stroke_is_noop() {
        let mut state = DrawingState::default();
        state.add_point(Point::new(1.0, 1.0));
        assert!(state.current_path().is_none());
        assert!(state.end_path().is_none());
    }

    #[test]
    fn test_start_path_while_open_is_rejected() {
        let mut state = DrawingState::default();
        state.start_path(Point::new(0.0, 0.0)).unwrap();
        state.add_point(Point::new(1.0, 1.0));

        assert_eq!(
            state.start_path(Point::new(50.0, 50.0)),
            Err(DrawingError::PathInProgress)
        );
        assert_eq!(state.current_path().unwrap().len(), 2);
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut state = DrawingState::default();
        for i in 0..4 {
            let offset = i as f64 * 10.0;
            draw(&mut state, &[(offset, 0.0), (offset, 10.0), (offset, 20.0)]);
        }
        let original = state.paths().to_vec();

        for _ in 0..original.len() {
            assert!(state.undo());
        }
        assert!(state.paths().is_empty());
        assert!(!state.undo());

        for _ in 0..original.len() {
            assert!(state.redo());
        }
        assert!(!state.redo());
        assert_eq!(state.paths(), original.as_slice());
    }

    #[test]
    fn test_new_stroke_clears_redo() {
        let mut state = DrawingState::default();
        draw(&mut state, &[(0.0, 0.0), (10.0, 0.0)]);
        draw(&mut state, &[(0.0, 5.0), (10.0, 5.0)]);
        state.undo();
        assert!(state.can_redo());

        draw(&mut state, &[(0.0, 9.0), (10.0, 9.0)]);
        assert!(state.undo_stack().is_empty());
        assert!(!state.can_redo());
    }

    #[test]
    fn test_discarded_tap_keeps_redo() {
        let mut state = DrawingState::default();
        draw(&mut state, &[(0.0, 0.0), (10.0, 0.0)]);
        state.undo();
        draw(&mut state, &[(3.0, 3.0)]);
        assert!(state.can_redo());
    }

    #[test]
    fn test_eraser_width_and_color() {
        let mut state = DrawingState::default();
        state.set_background_color(Rgba::rgb(10, 20, 30));
        state.set_line_width(4.0);
        state.set_tool(Tool::Eraser);
        state.start_path(Point::ZERO).unwrap();

        let stroke = state.current_path().unwrap();
        assert!(stroke.is_eraser);
        assert!((stroke.line_width - 10.0).abs() < f64::EPSILON);
        assert_eq!(stroke.color, state.erase_color());
        assert_eq!(stroke.color, Rgba::rgb(10, 20, 30));
    }

    #[test]
    fn test_style_change_mid_stroke_not_retroactive() {
        let mut state = DrawingState::default();
        state.set_color(Rgba::rgb(255, 0, 0));
        state.start_path(Point::ZERO).unwrap();
        state.set_color(Rgba::rgb(0, 0, 255));
        state.set_line_width(20.0);
        state.add_point(Point::new(5.0, 5.0));
        state.end_path();

        assert_eq!(state.paths()[0].color, Rgba::rgb(255, 0, 0));
        assert!((state.paths()[0].line_width - 5.0).abs() < f64::EPSILON);
    }

    fn populated() -> DrawingState {
        let mut state = DrawingState::default();
        draw(&mut state, &[(0.0, 0.0), (10.0, 0.0)]);
        draw(&mut state, &[(0.0, 5.0), (10.0, 5.0)]);
        state.set_background_color(Rgba::rgb(255, 204, 0));
        state.set_background_image(photo());
        state
    }

    #[test]
    fn test_clear_keeps_background_color() {
        let mut state = populated();
        state.clear();
        assert!(state.paths().is_empty());
        assert!(state.background_image().is_none());
        assert_eq!(state.background_color(), Rgba::rgb(255, 204, 0));
        assert!(state.is_empty());
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut state = populated();
        state.set_image_scale(2.0);
        state.clear_all();
        assert!(state.is_empty());
        assert_eq!(state.background_color(), Rgba::white());
        assert_eq!(state.image_transform(), ImageTransform::default());
    }

    #[test]
    fn test_clear_drawing_only_keeps_photo_and_color() {
        let mut state = populated();
        state.undo();
        state.clear_drawing_only();
        assert!(state.paths().is_empty());
        assert!(!state.can_redo());
        assert!(state.background_image().is_some());
        assert_eq!(state.background_color(), Rgba::rgb(255, 204, 0));
    }

    #[test]
    fn test_transform_hint() {
        let mut state = DrawingState::default();
        assert!(!state.show_transform_hint());
        state.set_background_image(photo());
        assert!(state.show_transform_hint());
        state.start_path(Point::ZERO).unwrap();
        assert!(!state.show_transform_hint());
    }

    #[test]
    fn test_image_scale_always_clamped() {
        let mut state = DrawingState::default();
        state.set_image_scale(10.0);
        assert!((state.image_scale() - 3.0).abs() < f64::EPSILON);
        state.set_image_scale(0.1);
        assert!((state.image_scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_canvas_resize_reclamps_offset() {
        let mut state = DrawingState::default();
        state.set_background_image(photo());
        state.set_canvas_size(Size::new(300.0, 300.0));
        state.set_image_offset(Vec2::new(1000.0, 0.0));
        state.set_canvas_size(Size::new(400.0, 300.0));
        // 4:3 photo exactly fills a 400x300 canvas at scale 1.
        assert_eq!(state.image_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_json_roundtrip_keeps_strokes() {
        let mut state = DrawingState::default();
        draw(&mut state, &[(0.0, 0.0), (10.0, 0.0), (20.0, 5.0)]);
        state.set_background_color(Rgba::rgb(1, 2, 3));

        let json = state.to_json().unwrap();
        let restored = DrawingState::from_json(&json, DrawingConfig::default()).unwrap();
        assert_eq!(restored.paths(), state.paths());
        assert_eq!(restored.background_color(), Rgba::rgb(1, 2, 3));
        assert!(!restored.can_redo());
    }
}
