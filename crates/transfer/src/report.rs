//! Turning a finished [`TransferOutcome`] into user-facing feedback.

use ezupload_protocol::PickerMessage;

use crate::types::TransferOutcome;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A single notification shown once at the end of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Builds the end-of-batch notice.
///
/// A cancelled batch reports partial counts (plus any failures seen before
/// the stop). Otherwise failures win over skips, and skips over a plain
/// success count.
pub fn summarize(outcome: &TransferOutcome) -> Notice {
    if let Some(stop) = outcome.cancellation() {
        let mut message = format!(
            "Upload cancelled. {} file(s) uploaded, {} remaining.",
            outcome.success_count(),
            stop.remaining
        );
        for failure in outcome.errors() {
            message.push('\n');
            message.push_str(&failure.to_string());
        }
        return Notice::warning(message);
    }

    if !outcome.errors().is_empty() {
        let lines: Vec<String> = outcome.errors().iter().map(ToString::to_string).collect();
        return Notice::error(format!(
            "Upload completed with errors:\n{}",
            lines.join("\n")
        ));
    }

    if !outcome.skipped().is_empty() {
        return Notice::info(format!(
            "Uploaded {} file(s), skipped {} file(s).",
            outcome.success_count(),
            outcome.skipped().len()
        ));
    }

    Notice::info(format!(
        "Successfully uploaded {} file(s).",
        outcome.success_count()
    ))
}

/// The terminal message sent back to the picker surface for a batch.
pub fn surface_reply(outcome: &TransferOutcome) -> PickerMessage {
    if outcome.is_cancelled() {
        return PickerMessage::UploadError {
            message: summarize(outcome).message,
        };
    }
    if !outcome.errors().is_empty() {
        let lines: Vec<String> = outcome.errors().iter().map(ToString::to_string).collect();
        return PickerMessage::UploadError {
            message: lines.join(", "),
        };
    }
    PickerMessage::UploadComplete
}

/// Returns `true` when the picker surface should close after this batch.
///
/// It stays open on any error so the user can retry.
pub fn should_dismiss_surface(outcome: &TransferOutcome) -> bool {
    outcome.is_clean()
}
