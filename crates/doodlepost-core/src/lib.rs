//! Doodlepost Core Library
//!
//! Platform-agnostic drawing state, gesture routing and export geometry for
//! sending a hand-drawn doodle.

pub mod background;
pub mod color;
pub mod config;
pub mod drawing;
pub mod export;
pub mod gesture;
pub mod input;
pub mod metadata;
pub mod session;
pub mod stroke;
pub mod transform;

pub use background::{BackgroundImage, ImageError, ImageFormat};
pub use color::{ColorError, Rgba};
pub use config::{ConfigError, DrawingConfig};
pub use drawing::{DrawingError, DrawingState, Tool};
pub use export::{EXPORT_PIXEL_RATIO, ExportPlan};
pub use gesture::{GestureEvent, GesturePhase, GestureRouter, GestureState};
pub use input::{TouchEvent, TouchPhase, TouchTracker};
pub use metadata::{DoodleMetadata, FileStore, MemoryStore, MetadataStore, StoreError, StoreResult};
pub use session::{DoodleSession, SessionHandle, SessionMessage};
pub use stroke::{Stroke, StrokeId};
pub use transform::{ImageTransform, MAX_IMAGE_SCALE, MIN_IMAGE_SCALE};
