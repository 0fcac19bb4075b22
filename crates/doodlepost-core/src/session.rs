//! Editing session: the single writer of a [`DrawingState`].
//!
//! Input and decode results from other threads are posted through a
//! [`SessionHandle`] and applied in arrival order by [`DoodleSession::pump`]
//! on the thread that owns the session.

use crate::background::{BackgroundImage, ImageError};
use crate::config::DrawingConfig;
use crate::drawing::DrawingState;
use crate::gesture::{GestureEvent, GestureRouter, GestureState};
use crate::input::{TouchEvent, TouchTracker};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};

/// Messages accepted by a session from other threads.
#[derive(Debug)]
pub enum SessionMessage {
    /// A raw finger sample.
    Touch(TouchEvent),
    /// An already-recognized gesture.
    Gesture(GestureEvent),
    /// A photo finished decoding off the owning thread.
    BackgroundDecoded(BackgroundImage),
    /// A photo failed to decode; the drawing is left untouched.
    BackgroundFailed(String),
}

/// Cloneable sender for posting work to a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<SessionMessage>,
}

impl SessionHandle {
    /// Post a message. Returns false if the session is gone.
    pub fn post(&self, message: SessionMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Decode `bytes` on a worker thread and post the result.
    pub fn load_background(&self, bytes: Vec<u8>) -> JoinHandle<()> {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let message = match BackgroundImage::decode(&bytes) {
                Ok(image) => SessionMessage::BackgroundDecoded(image),
                Err(e) => SessionMessage::BackgroundFailed(e.to_string()),
            };
            if tx.send(message).is_err() {
                log::debug!("Session closed before background decode finished");
            }
        })
    }
}

/// One doodle being composed.
pub struct DoodleSession {
    drawing: DrawingState,
    router: GestureRouter,
    tracker: TouchTracker,
    tx: Sender<SessionMessage>,
    rx: Receiver<SessionMessage>,
}

impl Default for DoodleSession {
    fn default() -> Self {
        Self::new(DrawingConfig::default())
    }
}

impl DoodleSession {
    /// Start a session with an empty drawing.
    pub fn new(config: DrawingConfig) -> Self {
        Self::with_drawing(DrawingState::new(config))
    }

    /// Resume a session around an existing drawing.
    pub fn with_drawing(drawing: DrawingState) -> Self {
        let (tx, rx) = channel();
        Self {
            drawing,
            router: GestureRouter::new(),
            tracker: TouchTracker::new(),
            tx,
            rx,
        }
    }

    /// Handle for posting from other threads.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn drawing(&self) -> &DrawingState {
        &self.drawing
    }

    pub fn drawing_mut(&mut self) -> &mut DrawingState {
        &mut self.drawing
    }

    pub fn router(&self) -> &GestureRouter {
        &self.router
    }

    /// Feed a finger sample on the owning thread.
    pub fn touch(&mut self, touch: TouchEvent) {
        for event in self.tracker.handle(touch) {
            self.router.push(event);
        }
        self.router.drain(&mut self.drawing);
    }

    /// Feed a recognized gesture on the owning thread.
    pub fn gesture(&mut self, event: GestureEvent) {
        self.router.push(event);
        self.router.drain(&mut self.drawing);
    }

    /// Decode a photo synchronously and place it behind the strokes.
    ///
    /// On failure the drawing is unchanged.
    pub fn set_background_bytes(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        let image = BackgroundImage::decode(bytes)?;
        self.drawing.set_background_image(image);
        Ok(())
    }

    /// Decode a photo on a worker thread; it is applied by a later
    /// [`Self::pump`].
    pub fn load_background_async(&self, bytes: Vec<u8>) -> JoinHandle<()> {
        self.handle().load_background(bytes)
    }

    /// Apply every message posted so far. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.apply(message);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    fn apply(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Touch(touch) => self.touch(touch),
            SessionMessage::Gesture(event) => self.gesture(event),
            SessionMessage::BackgroundDecoded(image) => self.drawing.set_background_image(image),
            SessionMessage::BackgroundFailed(reason) => {
                log::warn!("Background image not loaded: {}", reason);
            }
        }
    }

    /// Bring the drawing into an exportable state.
    ///
    /// Drops an open stroke too short to keep and clamps the photo. A
    /// two-finger gesture still in flight is ended, so its unclamped offset
    /// never reaches an export.
    pub fn settle(&mut self) {
        let mut interrupted = false;
        if self.drawing.current_path().is_some_and(|s| !s.is_committable()) {
            self.drawing.cancel_path();
            interrupted = true;
        }
        if matches!(self.router.state(), GestureState::Transforming { .. }) {
            interrupted = true;
        }
        if self.drawing.background_image().is_some() {
            self.drawing.clamp_image_transform();
        }
        if interrupted {
            log::debug!("Settled session with a gesture in progress");
            self.router = GestureRouter::new();
            self.tracker = TouchTracker::new();
        }
    }

    /// Return to a pristine session after a successful send.
    pub fn reset(&mut self) {
        self.drawing.clear_all();
        self.router = GestureRouter::new();
        self.tracker = TouchTracker::new();
    }
}
