use std::path::{Path, PathBuf};

/// Where a batch goes and how that was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Target directory for every entry.
    pub destination: PathBuf,
    /// `true` when the caller supplied the destination (e.g. a folder
    /// picked from a context menu) rather than having it inferred.
    pub explicit: bool,
}

/// One file to transfer.
///
/// Within a batch all entries share one variant: the native source yields
/// paths, the buffered source yields in-memory content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEntry {
    /// A local file, read lazily by the copy primitive.
    Path { source: PathBuf },
    /// Content already in memory, delivered by the picker surface.
    Buffer { name: String, bytes: Vec<u8> },
}

impl SourceEntry {
    /// Display name used in prompts, progress and the outcome.
    pub fn name(&self) -> String {
        match self {
            SourceEntry::Path { source } => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string()),
            SourceEntry::Buffer { name, .. } => name.clone(),
        }
    }

    /// Returns `true` if both entries are the same variant.
    pub fn same_variant(&self, other: &SourceEntry) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Source path for native entries.
    pub fn source_path(&self) -> Option<&Path> {
        match self {
            SourceEntry::Path { source } => Some(source),
            SourceEntry::Buffer { .. } => None,
        }
    }
}

/// What to do with one target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Write the target (it is missing, or the user chose to overwrite).
    Proceed,
    /// Leave the existing target untouched.
    Skip,
    /// Stop the whole batch. Not produced by the current resolver.
    Abort,
}

/// A per-file failure recorded in the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub name: String,
    pub message: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Where a cancelled batch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancellation {
    /// Entries handled (written, skipped or failed) before the stop.
    pub processed: usize,
    /// Entries never looked at.
    pub remaining: usize,
}

/// Aggregated result of one batch.
///
/// Built by [`BatchTransfer`](crate::BatchTransfer) and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    success_count: usize,
    skipped: Vec<String>,
    errors: Vec<FileFailure>,
    cancelled: Option<Cancellation>,
}

impl TransferOutcome {
    /// Number of entries written.
    pub fn success_count(&self) -> usize {
        self.success_count
    }

    /// Names skipped because the target existed, in input order.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Per-file failures, in input order.
    pub fn errors(&self) -> &[FileFailure] {
        &self.errors
    }

    /// Set when the batch stopped before its last entry.
    pub fn cancellation(&self) -> Option<Cancellation> {
        self.cancelled
    }

    /// Returns `true` if the batch was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_some()
    }

    /// Returns `true` if the batch ran to the end without hard errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.cancelled.is_none()
    }

    pub(crate) fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub(crate) fn record_skip(&mut self, name: String) {
        self.skipped.push(name);
    }

    pub(crate) fn record_failure(&mut self, name: String, message: String) {
        self.errors.push(FileFailure { name, message });
    }

    pub(crate) fn record_cancellation(&mut self, processed: usize, remaining: usize) {
        self.cancelled = Some(Cancellation {
            processed,
            remaining,
        });
    }
}

/// Progress event emitted while a batch runs.
///
/// Advisory only: dropping the receiver never affects the transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// The batch is about to start.
    Started { total: usize },
    /// Entry `index` (1-based) of `total` is being processed.
    Progress {
        index: usize,
        total: usize,
        name: String,
        /// Share of the whole batch this entry represents, in percent.
        increment: f64,
    },
    /// Every entry was processed.
    Finished {
        success_count: usize,
        skipped: usize,
        failed: usize,
    },
    /// The batch stopped early.
    Cancelled { processed: usize, remaining: usize },
}
