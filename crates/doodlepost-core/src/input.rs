//! Raw touch tracking.
//!
//! Converts per-finger touch samples into [`GestureEvent`]s. The number of
//! fingers down decides the gesture: one finger drags, two fingers pinch and
//! pan together.

use crate::gesture::{GestureEvent, GesturePhase};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Phase of a single finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// One finger sample in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Stable identifier of the finger for the duration of the touch.
    pub id: u64,
    pub phase: TouchPhase,
    pub location: Point,
}

impl TouchEvent {
    pub fn new(id: u64, phase: TouchPhase, location: Point) -> Self {
        Self { id, phase, location }
    }
}

/// Fingers closer than this do not produce a meaningful pinch ratio.
const MIN_PINCH_DISTANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Idle,
    OneFinger(u64),
    TwoFinger {
        first: u64,
        second: u64,
        start_distance: f64,
        start_centroid: Point,
        scale: f64,
        translation: Vec2,
    },
    /// A two-finger gesture ended; wait for every finger to lift before
    /// drawing again.
    Draining,
}

/// Tracks active touches and emits gesture events.
#[derive(Debug, Clone)]
pub struct TouchTracker {
    touches: BTreeMap<u64, Point>,
    mode: Mode,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTracker {
    /// Create a new tracker with no fingers down.
    pub fn new() -> Self {
        Self {
            touches: BTreeMap::new(),
            mode: Mode::Idle,
        }
    }

    /// Number of fingers currently tracked.
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Process one touch sample and return the gestures it produces.
    pub fn handle(&mut self, touch: TouchEvent) -> Vec<GestureEvent> {
        match touch.phase {
            TouchPhase::Began => self.touch_began(touch),
            TouchPhase::Moved => self.touch_moved(touch),
            TouchPhase::Ended => self.touch_lifted(touch, GesturePhase::Ended),
            TouchPhase::Cancelled => self.touch_lifted(touch, GesturePhase::Cancelled),
        }
    }

    fn touch_began(&mut self, touch: TouchEvent) -> Vec<GestureEvent> {
        if self.touches.len() >= 2 {
            // Only the first two fingers take part in gestures.
            return Vec::new();
        }
        self.touches.insert(touch.id, touch.location);

        match self.mode {
            Mode::Idle => {
                self.mode = Mode::OneFinger(touch.id);
                vec![GestureEvent::Drag {
                    phase: GesturePhase::Began,
                    location: touch.location,
                }]
            }
            Mode::OneFinger(first) => {
                let mut events = Vec::with_capacity(3);
                if let Some(location) = self.touches.get(&first) {
                    events.push(GestureEvent::Drag {
                        phase: GesturePhase::Cancelled,
                        location: *location,
                    });
                }
                events.extend(self.begin_two_finger(first, touch.id));
                events
            }
            Mode::TwoFinger { .. } | Mode::Draining => Vec::new(),
        }
    }

    fn begin_two_finger(&mut self, first: u64, second: u64) -> Vec<GestureEvent> {
        let (Some(a), Some(b)) = (self.touches.get(&first), self.touches.get(&second)) else {
            return Vec::new();
        };
        self.mode = Mode::TwoFinger {
            first,
            second,
            start_distance: a.distance(*b),
            start_centroid: a.midpoint(*b),
            scale: 1.0,
            translation: Vec2::ZERO,
        };
        log::debug!("Two-finger gesture began ({} and {})", first, second);
        vec![
            GestureEvent::Pinch {
                phase: GesturePhase::Began,
                scale: 1.0,
            },
            GestureEvent::Pan {
                phase: GesturePhase::Began,
                translation: Vec2::ZERO,
            },
        ]
    }

    fn touch_moved(&mut self, touch: TouchEvent) -> Vec<GestureEvent> {
        let Some(location) = self.touches.get_mut(&touch.id) else {
            return Vec::new();
        };
        *location = touch.location;

        match &mut self.mode {
            Mode::OneFinger(id) if *id == touch.id => vec![GestureEvent::Drag {
                phase: GesturePhase::Changed,
                location: touch.location,
            }],
            Mode::TwoFinger {
                first,
                second,
                start_distance,
                start_centroid,
                scale,
                translation,
            } => {
                let (Some(a), Some(b)) = (self.touches.get(&*first), self.touches.get(&*second)) else {
                    return Vec::new();
                };
                *scale = if *start_distance > MIN_PINCH_DISTANCE {
                    a.distance(*b) / *start_distance
                } else {
                    1.0
                };
                *translation = a.midpoint(*b) - *start_centroid;
                vec![
                    GestureEvent::Pinch {
                        phase: GesturePhase::Changed,
                        scale: *scale,
                    },
                    GestureEvent::Pan {
                        phase: GesturePhase::Changed,
                        translation: *translation,
                    },
                ]
            }
            _ => Vec::new(),
        }
    }

    fn touch_lifted(&mut self, touch: TouchEvent, phase: GesturePhase) -> Vec<GestureEvent> {
        if self.touches.remove(&touch.id).is_none() {
            return Vec::new();
        }

        let events = match self.mode {
            Mode::OneFinger(id) if id == touch.id => {
                self.mode = Mode::Idle;
                vec![GestureEvent::Drag {
                    phase,
                    location: touch.location,
                }]
            }
            Mode::TwoFinger {
                scale, translation, ..
            } => {
                self.mode = Mode::Draining;
                vec![
                    GestureEvent::Pinch { phase, scale },
                    GestureEvent::Pan { phase, translation },
                ]
            }
            _ => Vec::new(),
        };

        if self.touches.is_empty() {
            self.mode = Mode::Idle;
        }
        events
    }
}
