//! Handler trait for messages arriving from the picker surface.
//!
//! Implementors provide the transfer side; the server handles connection
//! management and routing.

use std::future::Future;
use std::pin::Pin;

use ezupload_protocol::PickedFile;

use crate::connection::Sender;

/// A boxed future returned by handler methods.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Trait for handling messages from the surface.
///
/// Methods run inside the connection's read pump, so long work should be
/// handed off (e.g. over a channel) rather than awaited here.
pub trait Handler: Send + Sync + 'static {
    /// Called for `upload`: the surface submitted a batch.
    ///
    /// The handler must eventually answer with exactly one
    /// `uploadComplete` or `uploadError` through `sender`.
    fn on_upload(&self, sender: Sender, files: Vec<PickedFile>) -> HandlerFuture<'_>;

    /// Called for `error`: the surface failed to read a queued file and
    /// submitted nothing.
    fn on_read_error(&self, _sender: Sender, message: String) -> HandlerFuture<'_> {
        Box::pin(async move {
            tracing::warn!(%message, "surface reported a read error");
        })
    }

    /// Called when the surface connection closes.
    fn on_disconnected(&self) -> HandlerFuture<'_> {
        Box::pin(async {})
    }
}
