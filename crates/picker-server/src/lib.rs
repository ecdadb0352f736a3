//! Host for the interactive picker surface.
//!
//! Two listeners make up the surface:
//! - [`PageServer`] serves the picker page over HTTP.
//! - [`PickerServer`] accepts a single surface connection at a time on a
//!   WebSocket channel, dispatches its messages to a [`Handler`], and
//!   manages the connection lifecycle (ping/pong, replacement, shutdown).
//!
//! The channel only accepts upgrades that present the per-session token
//! embedded in the page and come from the page's own origin.

mod connection;
mod handler;
mod page;
mod server;
mod token;

pub use connection::{PickerConnection, SendError, Sender};
pub use handler::{Handler, HandlerFuture};
pub use page::{PageServer, render_page};
pub use server::{PickerServer, ServerConfig};

/// Send buffer capacity.
///
/// The engine only sends one terminal reply per batch, so this stays small.
pub const SEND_BUFFER_SIZE: usize = 32;

/// Errors produced by the picker servers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("server already running")]
    AlreadyRunning,

    #[error("picker already connected")]
    PickerAlreadyConnected,
}
