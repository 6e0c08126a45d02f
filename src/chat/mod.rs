//! Interactive chat for the vfchat CLI.
//!
//! The chat side is a plain loop:
//! - Reads a line from the user
//! - Turns it into a runtime request (free text or a picked button)
//! - Renders the traces that come back
//! - Optionally saves the transcript after every turn

pub mod input;
pub mod render;
pub mod session;

pub use input::{Input, LineSource, Readline};
pub use render::Renderer;
pub use session::ChatSession;
