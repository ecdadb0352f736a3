//! Confirm-before-transfer gate for the resolved destination.

use std::path::{Path, PathBuf};

use ezupload_file_ops::{FileKind, HostFs, expand_home};

use crate::prompt::{InputRequest, Prompter};
use crate::types::TransferRequest;

pub const CONFIRM_TITLE: &str = "Upload Location";
pub const CONFIRM_PROMPT: &str = "Confirm upload location (press Enter to confirm, Esc to cancel)";

/// Why a typed destination was rejected. The message is shown verbatim
/// under the input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Path cannot be empty")]
    Empty,

    #[error("Path must be a directory")]
    NotADirectory,

    #[error("Directory does not exist")]
    Missing,
}

/// Returns `true` if the destination must be confirmed before transferring.
///
/// Inferred destinations are always confirmed. A destination the caller
/// supplied (context-menu style) is confirmed only when `confirm_explicit`
/// is enabled in the configuration.
pub fn should_confirm(explicit: bool, confirm_explicit: bool) -> bool {
    !explicit || confirm_explicit
}

/// Checks a typed destination against the filesystem.
pub async fn validate_destination(
    fs: &dyn HostFs,
    value: &str,
) -> Result<PathBuf, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let path = expand_home(trimmed);
    match fs.stat(&path).await {
        Ok(stat) if stat.kind == FileKind::Directory => Ok(path),
        Ok(_) => Err(ValidationError::NotADirectory),
        Err(_) => Err(ValidationError::Missing),
    }
}

/// Shows the editable destination prompt until the user enters a valid
/// directory or cancels (`None`).
pub async fn confirm_destination(
    prompter: &dyn Prompter,
    fs: &dyn HostFs,
    resolved: &Path,
) -> Option<PathBuf> {
    let mut value = resolved.display().to_string();
    let mut error: Option<ValidationError> = None;

    loop {
        let reason = error.map(|e| e.to_string());
        let answer = prompter
            .input(InputRequest {
                title: CONFIRM_TITLE,
                prompt: CONFIRM_PROMPT,
                value: &value,
                error: reason.as_deref(),
            })
            .await;

        let Some(answer) = answer else {
            tracing::debug!("destination prompt cancelled");
            return None;
        };

        match validate_destination(fs, &answer).await {
            Ok(path) => return Some(path),
            Err(e) => {
                tracing::debug!(value = %answer, "destination rejected: {e}");
                value = answer;
                error = Some(e);
            }
        }
    }
}

/// Applies the gate to a resolved request.
///
/// Returns the directory to transfer into, or `None` if the user cancelled.
pub async fn confirm_request(
    request: &TransferRequest,
    confirm_explicit: bool,
    prompter: &dyn Prompter,
    fs: &dyn HostFs,
) -> Option<PathBuf> {
    if !should_confirm(request.explicit, confirm_explicit) {
        return Some(request.destination.clone());
    }
    confirm_destination(prompter, fs, &request.destination).await
}
