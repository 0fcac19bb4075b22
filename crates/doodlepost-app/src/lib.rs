//! Doodlepost application shell.
//!
//! Wires a [`DoodleSession`](doodlepost_core::DoodleSession) to the renderer
//! and the shared metadata store: replaying recorded sessions and sending the
//! finished doodle.

mod config;
mod script;
mod send;

pub use config::AppConfig;
pub use script::{Action, Script, ScriptError, replay};
pub use send::{SendError, SendPipeline, SendReceipt, SenderProfile};
