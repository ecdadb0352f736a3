//! Wire protocol between the interactive picker surface and the transfer
//! engine.
//!
//! The surface (a browser page) and the engine exchange JSON text frames
//! over a single WebSocket. Every frame is one [`PickerMessage`],
//! discriminated by its `type` field.

pub mod constants;
pub mod messages;
pub mod size;

// Re-export primary types for convenience.
pub use messages::{Direction, PickedFile, PickerMessage};
pub use size::format_file_size;
