//! Per-target overwrite decision.

use std::path::Path;

use ezupload_file_ops::HostFs;

use crate::prompt::{OverwriteChoice, Prompter};
use crate::types::ConflictDecision;

/// Decides what happens to a target path before it is written.
///
/// A missing target proceeds without asking. An existing one (file or
/// directory, they are not told apart) triggers a modal Overwrite/Skip
/// prompt; only an explicit Overwrite proceeds, a dismissed prompt skips.
pub struct ConflictResolver<'a> {
    fs: &'a dyn HostFs,
    prompter: &'a dyn Prompter,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(fs: &'a dyn HostFs, prompter: &'a dyn Prompter) -> Self {
        Self { fs, prompter }
    }

    /// Returns the decision for `target`.
    pub async fn resolve(&self, target: &Path) -> ConflictDecision {
        if let Err(e) = self.fs.stat(target).await {
            tracing::debug!(target = %target.display(), "target free ({e})");
            return ConflictDecision::Proceed;
        }

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());

        match self.prompter.confirm_overwrite(&name).await {
            Some(OverwriteChoice::Overwrite) => {
                tracing::debug!(%name, "overwriting existing target");
                ConflictDecision::Proceed
            }
            Some(OverwriteChoice::Skip) | None => {
                tracing::debug!(%name, "keeping existing target");
                ConflictDecision::Skip
            }
        }
    }
}
