//! Sequential batch transfer.
//!
//! Entries are processed strictly in order, one at a time, so conflict
//! prompts are serialized. The cancellation token is checked before every
//! entry and never mid-write: a write that started always completes or
//! fails on its own.

use std::path::Path;

use ezupload_file_ops::HostFs;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::conflict::ConflictResolver;
use crate::prompt::Prompter;
use crate::types::{ConflictDecision, SourceEntry, TransferEvent, TransferOutcome};
use crate::validation::target_name;

/// Runs one batch of entries into a destination directory.
pub struct BatchTransfer<'a> {
    fs: &'a dyn HostFs,
    resolver: ConflictResolver<'a>,
    events_tx: Option<mpsc::Sender<TransferEvent>>,
}

impl<'a> BatchTransfer<'a> {
    pub fn new(fs: &'a dyn HostFs, prompter: &'a dyn Prompter) -> Self {
        Self {
            fs,
            resolver: ConflictResolver::new(fs, prompter),
            events_tx: None,
        }
    }

    /// Sends progress events to `tx` while the batch runs.
    pub fn with_events(mut self, tx: mpsc::Sender<TransferEvent>) -> Self {
        self.events_tx = Some(tx);
        self
    }

    /// Transfers `entries` into `destination`.
    ///
    /// Per-file failures never abort the batch; they are recorded in the
    /// outcome and the next entry is attempted.
    pub async fn run(
        &self,
        entries: &[SourceEntry],
        destination: &Path,
        cancel: &CancellationToken,
    ) -> TransferOutcome {
        debug_assert!(
            entries.windows(2).all(|w| w[0].same_variant(&w[1])),
            "mixed entry variants in one batch"
        );

        let total = entries.len();
        let increment = if total == 0 { 0.0 } else { 100.0 / total as f64 };
        let mut outcome = TransferOutcome::default();

        info!(total, destination = %destination.display(), "transfer started");
        self.emit(TransferEvent::Started { total }).await;

        for (i, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                return self.stop(outcome, i, total).await;
            }

            let name = entry.name();
            self.emit(TransferEvent::Progress {
                index: i + 1,
                total,
                name: name.clone(),
                increment,
            })
            .await;

            let file_name = match target_name(&name) {
                Ok(n) => n,
                Err(e) => {
                    warn!(%name, "rejected: {e}");
                    outcome.record_failure(name.clone(), e.to_string());
                    continue;
                }
            };
            let target = self.fs.join_path(destination, file_name);

            match self.resolver.resolve(&target).await {
                ConflictDecision::Proceed => {}
                ConflictDecision::Skip => {
                    outcome.record_skip(name);
                    continue;
                }
                ConflictDecision::Abort => return self.stop(outcome, i, total).await,
            }

            let written = match entry {
                SourceEntry::Path { source } => self.fs.copy(source, &target, true).await,
                SourceEntry::Buffer { bytes, .. } => self.fs.write_file(&target, bytes).await,
            };

            match written {
                Ok(()) => {
                    debug!(%name, target = %target.display(), "transferred");
                    outcome.record_success();
                }
                Err(e) => {
                    warn!(%name, error = %e, "transfer failed");
                    outcome.record_failure(name, e.to_string());
                }
            }
        }

        info!(
            success = outcome.success_count(),
            skipped = outcome.skipped().len(),
            failed = outcome.errors().len(),
            "transfer finished"
        );
        self.emit(TransferEvent::Finished {
            success_count: outcome.success_count(),
            skipped: outcome.skipped().len(),
            failed: outcome.errors().len(),
        })
        .await;
        outcome
    }

    async fn stop(&self, mut outcome: TransferOutcome, processed: usize, total: usize) -> TransferOutcome {
        let remaining = total - processed;
        info!(processed, remaining, "transfer cancelled");
        outcome.record_cancellation(processed, remaining);
        self.emit(TransferEvent::Cancelled {
            processed,
            remaining,
        })
        .await;
        outcome
    }

    async fn emit(&self, event: TransferEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::OverwriteChoice;
    use crate::test_support::{MemFs, ScriptedPrompter};
    use ezupload_file_ops::LocalFs;
    use std::path::PathBuf;

    fn buffers(names: &[&str]) -> Vec<SourceEntry> {
        names
            .iter()
            .map(|n| SourceEntry::Buffer {
                name: n.to_string(),
                bytes: n.as_bytes().to_vec(),
            })
            .collect()
    }

    #[tokio::test]
    async fn all_new_files_succeed() {
        let fs = MemFs::new().with_file("/src/a.txt", b"A").with_file("/src/b.txt", b"B");
        let prompter = ScriptedPrompter::new();
        let entries = vec![
            SourceEntry::Path { source: "/src/a.txt".into() },
            SourceEntry::Path { source: "/src/b.txt".into() },
        ];

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&entries, Path::new("/dst"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 2);
        assert!(outcome.is_clean());
        assert!(outcome.skipped().is_empty());
        assert!(prompter.asked().is_empty());
        assert_eq!(fs.read("/dst/a.txt").unwrap(), b"A");
        assert_eq!(fs.read("/dst/b.txt").unwrap(), b"B");
    }

    #[tokio::test]
    async fn skip_leaves_existing_target_untouched() {
        let fs = MemFs::new()
            .with_file("/src/a.txt", b"new")
            .with_file("/src/b.txt", b"B")
            .with_file("/dst/a.txt", b"old");
        let prompter = ScriptedPrompter::answering(&[Some(OverwriteChoice::Skip)]);
        let entries = vec![
            SourceEntry::Path { source: "/src/a.txt".into() },
            SourceEntry::Path { source: "/src/b.txt".into() },
        ];

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&entries, Path::new("/dst"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.skipped(), ["a.txt".to_string()]);
        assert!(outcome.errors().is_empty());
        assert_eq!(fs.read("/dst/a.txt").unwrap(), b"old");
        assert_eq!(prompter.asked(), vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn overwrite_replaces_content_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::create_dir_all(&dst_dir).unwrap();
        std::fs::write(src_dir.join("notes.md"), b"fresh").unwrap();
        std::fs::write(dst_dir.join("notes.md"), b"stale content").unwrap();

        let prompter = ScriptedPrompter::answering(&[Some(OverwriteChoice::Overwrite)]);
        let entries = vec![SourceEntry::Path {
            source: src_dir.join("notes.md"),
        }];

        let outcome = BatchTransfer::new(&LocalFs, &prompter)
            .run(&entries, &dst_dir, &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 1);
        assert!(outcome.is_clean());
        assert_eq!(std::fs::read(dst_dir.join("notes.md")).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_batch() {
        let fs = MemFs::new().failing_on("/dst/b.txt");
        let prompter = ScriptedPrompter::new();
        let entries = buffers(&["a.txt", "b.txt", "c.txt"]);

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&entries, Path::new("/dst"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].name, "b.txt");
        assert_eq!(outcome.errors()[0].to_string(), "b.txt: permission denied");
        assert!(fs.read("/dst/c.txt").is_some());
        assert!(!outcome.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_entry() {
        let cancel = CancellationToken::new();
        let fs = MemFs::new().cancel_after(2, cancel.clone());
        let prompter = ScriptedPrompter::new();
        let entries = buffers(&["a", "b", "c", "d", "e"]);

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&entries, Path::new("/dst"), &cancel)
            .await;

        let stop = outcome.cancellation().unwrap();
        assert_eq!(stop.processed, 2);
        assert_eq!(stop.remaining, 3);
        assert_eq!(outcome.success_count() + outcome.skipped().len(), 2);
        assert_eq!(
            fs.written(),
            vec![PathBuf::from("/dst/a"), PathBuf::from("/dst/b")]
        );
    }

    #[tokio::test]
    async fn cancelled_before_start_touches_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let fs = MemFs::new();
        let prompter = ScriptedPrompter::new();

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&buffers(&["a", "b"]), Path::new("/dst"), &cancel)
            .await;

        assert_eq!(outcome.success_count(), 0);
        assert_eq!(outcome.cancellation().unwrap().remaining, 2);
        assert!(fs.written().is_empty());
    }

    #[tokio::test]
    async fn buffered_bytes_land_verbatim() {
        let fs = MemFs::new();
        let prompter = ScriptedPrompter::new();
        let entries = vec![SourceEntry::Buffer {
            name: "a.txt".into(),
            bytes: vec![72, 105],
        }];

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&entries, Path::new("/dst"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 1);
        assert_eq!(fs.read("/dst/a.txt").unwrap(), b"Hi");
    }

    #[tokio::test]
    async fn traversal_names_stay_in_destination() {
        let fs = MemFs::new();
        let prompter = ScriptedPrompter::new();
        let entries = buffers(&["../../etc/passwd", ".."]);

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&entries, Path::new("/dst"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 1);
        assert_eq!(fs.written(), vec![PathBuf::from("/dst/passwd")]);
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].name, "..");
    }

    #[tokio::test]
    async fn empty_batch_is_clean() {
        let fs = MemFs::new();
        let prompter = ScriptedPrompter::new();

        let outcome = BatchTransfer::new(&fs, &prompter)
            .run(&[], Path::new("/dst"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.success_count(), 0);
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn events_follow_the_batch() {
        let fs = MemFs::new().with_file("/dst/b", b"old");
        let prompter = ScriptedPrompter::answering(&[Some(OverwriteChoice::Skip)]);
        let (tx, mut rx) = mpsc::channel(16);

        BatchTransfer::new(&fs, &prompter)
            .with_events(tx)
            .run(&buffers(&["a", "b"]), Path::new("/dst"), &CancellationToken::new())
            .await;

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        assert_eq!(
            events,
            vec![
                TransferEvent::Started { total: 2 },
                TransferEvent::Progress {
                    index: 1,
                    total: 2,
                    name: "a".into(),
                    increment: 50.0,
                },
                TransferEvent::Progress {
                    index: 2,
                    total: 2,
                    name: "b".into(),
                    increment: 50.0,
                },
                TransferEvent::Finished {
                    success_count: 1,
                    skipped: 1,
                    failed: 0,
                },
            ]
        );
    }
}
