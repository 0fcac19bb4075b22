//! Gesture routing: one-finger drags draw, two-finger pinch/pan move the photo.
//!
//! Events are queued and applied in order by a small state machine:
//! `Idle -> Drawing -> Idle` for strokes and `Idle -> Transforming -> Idle`
//! for photo adjustments. Starting a photo adjustment cancels any open stroke.

use crate::drawing::DrawingState;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Lifecycle phase of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// A recognized gesture sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    /// One-finger drag at a canvas-local location.
    Drag { phase: GesturePhase, location: Point },
    /// Two-finger pinch; `scale` is the magnification since the pinch began.
    Pinch { phase: GesturePhase, scale: f64 },
    /// Two-finger pan; `translation` is the movement since the pan began.
    Pan { phase: GesturePhase, translation: Vec2 },
}

/// Which gesture currently owns the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing,
    Transforming {
        pinch: bool,
        pan: bool,
    },
}

/// Routes gesture events to drawing state mutations.
#[derive(Debug, Clone)]
pub struct GestureRouter {
    state: GestureState,
    queue: VecDeque<GestureEvent>,
    /// Photo scale when the current pinch began (or last settled).
    baseline_scale: f64,
    /// Photo offset when the current pan began (or last settled).
    baseline_offset: Vec2,
}

impl Default for GestureRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRouter {
    /// Create a new router in the idle state.
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            queue: VecDeque::new(),
            baseline_scale: 1.0,
            baseline_offset: Vec2::ZERO,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Queue an event for the next [`Self::drain`].
    pub fn push(&mut self, event: GestureEvent) {
        self.queue.push_back(event);
    }

    /// Number of queued events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply all queued events in arrival order.
    pub fn drain(&mut self, drawing: &mut DrawingState) {
        while let Some(event) = self.queue.pop_front() {
            self.handle(drawing, event);
        }
    }

    /// Apply a single event.
    pub fn handle(&mut self, drawing: &mut DrawingState, event: GestureEvent) {
        match event {
            GestureEvent::Drag { phase, location } => self.handle_drag(drawing, phase, location),
            GestureEvent::Pinch { phase, scale } => self.handle_pinch(drawing, phase, scale),
            GestureEvent::Pan { phase, translation } => self.handle_pan(drawing, phase, translation),
        }
    }

    fn handle_drag(&mut self, drawing: &mut DrawingState, phase: GesturePhase, location: Point) {
        match (self.state, phase) {
            (GestureState::Transforming { .. }, _) => {
                // The photo owns the canvas until both fingers lift.
            }
            (GestureState::Idle, GesturePhase::Began) => match drawing.start_path(location) {
                Ok(()) => self.state = GestureState::Drawing,
                Err(e) => log::warn!("Ignoring drag start: {}", e),
            },
            (GestureState::Drawing, GesturePhase::Began) => {
                log::warn!("Drag began while a stroke is open; ignoring");
            }
            (GestureState::Drawing, GesturePhase::Changed) => drawing.add_point(location),
            (GestureState::Drawing, GesturePhase::Ended) => {
                drawing.end_path();
                self.state = GestureState::Idle;
            }
            (GestureState::Drawing, GesturePhase::Cancelled) => {
                drawing.cancel_path();
                self.state = GestureState::Idle;
            }
            (GestureState::Idle, _) => {}
        }
    }

    fn handle_pinch(&mut self, drawing: &mut DrawingState, phase: GesturePhase, scale: f64) {
        if phase == GesturePhase::Began && drawing.background_image().is_none() {
            return;
        }
        match phase {
            GesturePhase::Began => {
                self.begin_transform(drawing);
                self.baseline_scale = drawing.image_scale();
                self.set_transforming(Some(true), None);
            }
            GesturePhase::Changed => {
                if self.is_pinching() {
                    drawing.set_image_scale(self.baseline_scale * scale);
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                if self.is_pinching() {
                    self.settle(drawing);
                    self.set_transforming(Some(false), None);
                }
            }
        }
    }

    fn handle_pan(&mut self, drawing: &mut DrawingState, phase: GesturePhase, translation: Vec2) {
        if phase == GesturePhase::Began && drawing.background_image().is_none() {
            return;
        }
        match phase {
            GesturePhase::Began => {
                self.begin_transform(drawing);
                self.baseline_offset = drawing.image_offset();
                self.set_transforming(None, Some(true));
            }
            GesturePhase::Changed => {
                if self.is_panning() {
                    drawing.set_image_offset(self.baseline_offset + translation);
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                if self.is_panning() {
                    self.settle(drawing);
                    self.set_transforming(None, Some(false));
                }
            }
        }
    }

    /// Cancel any open stroke before the photo takes over.
    fn begin_transform(&mut self, drawing: &mut DrawingState) {
        if self.state == GestureState::Drawing || drawing.is_drawing() {
            log::debug!("Two-finger gesture began; cancelling open stroke");
            drawing.cancel_path();
        }
        if !matches!(self.state, GestureState::Transforming { .. }) {
            self.state = GestureState::Transforming { pinch: false, pan: false };
        }
    }

    /// Clamp the photo and make the clamped transform the new baseline.
    fn settle(&mut self, drawing: &mut DrawingState) {
        let settled = drawing.clamp_image_transform();
        self.baseline_scale = settled.scale;
        self.baseline_offset = settled.offset;
    }

    fn set_transforming(&mut self, pinch: Option<bool>, pan: Option<bool>) {
        let (current_pinch, current_pan) = match self.state {
            GestureState::Transforming { pinch, pan } => (pinch, pan),
            _ => (false, false),
        };
        let pinch = pinch.unwrap_or(current_pinch);
        let pan = pan.unwrap_or(current_pan);
        self.state = if pinch || pan {
            GestureState::Transforming { pinch, pan }
        } else {
            GestureState::Idle
        };
    }

    fn is_pinching(&self) -> bool {
        matches!(self.state, GestureState::Transforming { pinch: true, .. })
    }

    fn is_panning(&self) -> bool {
        matches!(self.state, GestureState::Transforming { pan: true, .. })
    }
}
