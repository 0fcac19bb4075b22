//! Sending a finished doodle: export, write the PNG, publish metadata.

use chrono::Utc;
use doodlepost_core::color::Rgba;
use doodlepost_core::metadata::{DoodleMetadata, MetadataStore, StoreError};
use doodlepost_core::session::DoodleSession;
use doodlepost_render::{Renderer, RendererError, SkiaRenderer};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Send pipeline errors.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Nothing to send: the doodle is empty")]
    EmptyDoodle,
    #[error("Render failed: {0}")]
    Render(#[from] RendererError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata error: {0}")]
    Store(#[from] StoreError),
}

/// Who is sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub display_name: String,
    pub accent_color: Rgba,
}

impl Default for SenderProfile {
    fn default() -> Self {
        Self {
            display_name: "Me".to_string(),
            accent_color: Rgba::rgb(0, 122, 255),
        }
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub metadata: DoodleMetadata,
}

/// Exports sessions and publishes them to a metadata store.
pub struct SendPipeline<S: MetadataStore> {
    store: S,
    output_dir: PathBuf,
    profile: SenderProfile,
    renderer: SkiaRenderer,
}

impl<S: MetadataStore> SendPipeline<S> {
    pub fn new(store: S, output_dir: impl Into<PathBuf>, profile: SenderProfile) -> Self {
        Self {
            store,
            output_dir: output_dir.into(),
            profile,
            renderer: SkiaRenderer::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn profile(&self) -> &SenderProfile {
        &self.profile
    }

    /// Export the session at `target` logical size and publish it.
    ///
    /// The session is settled first, so a stroke too short to keep is
    /// dropped and the photo is clamped. On success the session is cleared.
    /// On failure the strokes are kept so the send can be retried.
    pub fn send(&mut self, session: &mut DoodleSession, target: Size) -> Result<SendReceipt, SendError> {
        session.settle();
        if session.drawing().is_empty() {
            log::warn!("Refusing to send an empty doodle");
            return Err(SendError::EmptyDoodle);
        }

        let exported = self
            .renderer
            .render_export(session.drawing(), target)
            .inspect_err(|e| log::error!("Export failed: {}", e))?;

        fs::create_dir_all(&self.output_dir)?;
        let doodle_id = Uuid::new_v4().to_string();
        let image_path = self.output_dir.join(format!("doodle-{}.png", doodle_id));
        fs::write(&image_path, &exported.png)?;

        let metadata = DoodleMetadata::new(
            image_path.to_string_lossy(),
            self.profile.display_name.clone(),
            self.profile.accent_color,
            Some(doodle_id),
            Utc::now(),
        );
        if let Err(e) = metadata.write_to(&self.store) {
            log::error!("Failed to publish doodle metadata: {}", e);
            if let Err(remove_err) = fs::remove_file(&image_path) {
                log::warn!("Could not remove {}: {}", image_path.display(), remove_err);
            }
            return Err(e.into());
        }

        session.reset();
        log::info!(
            "Sent doodle {} ({}x{}) as {}",
            image_path.display(),
            exported.width,
            exported.height,
            self.profile.display_name
        );

        Ok(SendReceipt {
            image_path,
            width: exported.width,
            height: exported.height,
            metadata,
        })
    }
}
