//! Doodlepost Render Library
//!
//! Renderer abstraction and implementations for Doodlepost.
//! The default implementation rasterizes on the CPU with tiny-skia, so the
//! same code path serves the on-screen canvas and the exported PNG.

mod renderer;
mod skia_impl;

pub use renderer::{ExportedImage, Frame, RenderContext, RenderResult, Renderer, RendererError};
pub use skia_impl::{SkiaRenderer, encode_png};
