//! Batch file transfer into a destination directory.
//!
//! # Pipeline
//!
//! 1. **Resolve** the destination ([`DestinationResolver`])
//! 2. **Gate** on user confirmation of the destination ([`confirm_request`])
//! 3. **Pick** a source provider from the execution environment
//!    ([`Environment`], [`NativeSource`] or [`BufferedSource`])
//! 4. **Transfer** the entries one by one ([`BatchTransfer`]), asking the
//!    [`ConflictResolver`] about every target that already exists
//! 5. **Report** the aggregated [`TransferOutcome`] ([`summarize`])

mod conflict;
mod destination;
mod engine;
mod environment;
mod gate;
mod prompt;
mod report;
mod source;
mod types;
mod validation;

#[cfg(test)]
mod test_support;

pub use conflict::ConflictResolver;
pub use destination::{ActiveDocument, DestinationResolver, HostContext};
pub use engine::BatchTransfer;
pub use environment::{Environment, TransferMode};
pub use gate::{
    CONFIRM_PROMPT, CONFIRM_TITLE, ValidationError, confirm_destination, confirm_request,
    should_confirm, validate_destination,
};
pub use prompt::{InputRequest, OverwriteChoice, PromptFuture, Prompter};
pub use report::{Notice, NoticeLevel, should_dismiss_surface, summarize, surface_reply};
pub use source::{
    BufferedSource, DialogOptions, FileDialog, NativeSource, SourceFuture, SourceProvider,
};
pub use types::{
    Cancellation, ConflictDecision, FileFailure, SourceEntry, TransferEvent, TransferOutcome,
    TransferRequest,
};
pub use validation::target_name;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("No destination folder available. Please open a workspace or file first.")]
    NoDestination,

    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Fs(#[from] ezupload_file_ops::FsError),
}
