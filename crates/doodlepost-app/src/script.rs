//! Recorded session scripts.
//!
//! A script is a JSON document listing the canvas size and the actions a user
//! performed. Replaying one drives a [`DoodleSession`] exactly as live input
//! would, which makes sessions reproducible from the command line.

use doodlepost_core::color::{ColorError, Rgba};
use doodlepost_core::config::DrawingConfig;
use doodlepost_core::drawing::Tool;
use doodlepost_core::gesture::GestureEvent;
use doodlepost_core::input::TouchEvent;
use doodlepost_core::session::DoodleSession;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid color: {0}")]
    Color(#[from] ColorError),
    #[error("Background decode worker panicked")]
    Worker,
}

/// One recorded user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// A raw finger sample.
    Touch(TouchEvent),
    /// An already-recognized gesture.
    Gesture { event: GestureEvent },
    SetColor { hex: String },
    SetTool { tool: Tool },
    SetLineWidth { width: f64 },
    SetBackgroundColor { hex: String },
    /// Load a photo; relative paths resolve against the script's directory.
    LoadBackground { path: PathBuf },
    RemoveBackground,
    Undo,
    Redo,
    Clear,
    ClearAll,
}

/// A recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// On-screen canvas size the actions were recorded on.
    pub canvas: Size,
    pub actions: Vec<Action>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Replay `script` into a fresh session.
///
/// `base_dir` resolves relative image paths. Photos are decoded on a worker
/// thread and applied through the session handle, like live loads.
pub fn replay(script: &Script, config: DrawingConfig, base_dir: &Path) -> Result<DoodleSession, ScriptError> {
    let mut session = DoodleSession::new(config);
    session.drawing_mut().set_canvas_size(script.canvas);

    for action in &script.actions {
        apply(&mut session, action, base_dir)?;
    }
    session.pump();

    log::debug!(
        "Replayed {} action(s): {} stroke(s), image: {}",
        script.actions.len(),
        session.drawing().paths().len(),
        session.drawing().background_image().is_some()
    );
    Ok(session)
}

fn apply(session: &mut DoodleSession, action: &Action, base_dir: &Path) -> Result<(), ScriptError> {
    match action {
        Action::Touch(touch) => session.touch(*touch),
        Action::Gesture { event } => session.gesture(*event),
        Action::SetColor { hex } => session.drawing_mut().set_color(Rgba::from_hex(hex)?),
        Action::SetTool { tool } => session.drawing_mut().set_tool(*tool),
        Action::SetLineWidth { width } => session.drawing_mut().set_line_width(*width),
        Action::SetBackgroundColor { hex } => {
            session.drawing_mut().set_background_color(Rgba::from_hex(hex)?)
        }
        Action::LoadBackground { path } => {
            let bytes = std::fs::read(base_dir.join(path))?;
            session
                .load_background_async(bytes)
                .join()
                .map_err(|_| ScriptError::Worker)?;
            session.pump();
        }
        Action::RemoveBackground => session.drawing_mut().remove_background_image(),
        Action::Undo => {
            session.drawing_mut().undo();
        }
        Action::Redo => {
            session.drawing_mut().redo();
        }
        Action::Clear => session.drawing_mut().clear(),
        Action::ClearAll => session.drawing_mut().clear_all(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r##"{
        "canvas": {"width": 100.0, "height": 80.0},
        "actions": [
            {"action": "set_color", "hex": "#FF0000"},
            {"action": "touch", "id": 1, "phase": "Began", "location": {"x": 10.0, "y": 10.0}},
            {"action": "touch", "id": 1, "phase": "Moved", "location": {"x": 50.0, "y": 40.0}},
            {"action": "touch", "id": 1, "phase": "Ended", "location": {"x": 50.0, "y": 40.0}},
            {"action": "gesture", "event": {"Drag": {"phase": "Began", "location": {"x": 0.0, "y": 0.0}}}},
            {"action": "gesture", "event": {"Drag": {"phase": "Changed", "location": {"x": 5.0, "y": 5.0}}}},
            {"action": "gesture", "event": {"Drag": {"phase": "Ended", "location": {"x": 5.0, "y": 5.0}}}},
            {"action": "undo"}
        ]
    }"##;

    #[test]
    fn test_parse_and_replay() {
        let script = Script::from_json(SCRIPT).unwrap();
        assert_eq!(script.actions.len(), 8);

        let session = replay(&script, DrawingConfig::default(), Path::new(".")).unwrap();
        let drawing = session.drawing();
        assert_eq!(drawing.canvas_size(), Some(Size::new(100.0, 80.0)));
        assert_eq!(drawing.paths().len(), 1);
        assert_eq!(drawing.paths()[0].color, Rgba::rgb(255, 0, 0));
        assert!(drawing.can_redo());
    }

    #[test]
    fn test_bad_color_rejected() {
        let script = Script {
            canvas: Size::new(10.0, 10.0),
            actions: vec![Action::SetColor {
                hex: "nope".to_string(),
            }],
        };
        assert!(matches!(
            replay(&script, DrawingConfig::default(), Path::new(".")),
            Err(ScriptError::Color(_))
        ));
    }

    #[test]
    fn test_missing_image_file() {
        let script = Script {
            canvas: Size::new(10.0, 10.0),
            actions: vec![Action::LoadBackground {
                path: PathBuf::from("does-not-exist.png"),
            }],
        };
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            replay(&script, DrawingConfig::default(), dir.path()),
            Err(ScriptError::Io(_))
        ));
    }
}
