//! Progress rendering for a running batch.

use std::path::Path;

use ezupload_file_ops::HostFs;
use ezupload_transfer::{
    BatchTransfer, InputRequest, OverwriteChoice, PromptFuture, Prompter, SourceEntry,
    TransferEvent, TransferOutcome,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drives `bar` from transfer events until the sender is dropped.
pub async fn render(mut rx: mpsc::Receiver<TransferEvent>, bar: ProgressBar) {
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} Uploading files [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }

    while let Some(event) = rx.recv().await {
        match event {
            TransferEvent::Started { total } => bar.set_length(total as u64),
            TransferEvent::Progress {
                index, total, name, ..
            } => {
                bar.set_position(index.saturating_sub(1) as u64);
                bar.set_message(format!("{name} ({index}/{total})"));
            }
            TransferEvent::Finished { .. } => {
                bar.set_position(bar.length().unwrap_or(0));
                bar.finish_and_clear();
            }
            TransferEvent::Cancelled { .. } => bar.abandon_with_message("cancelled"),
        }
    }
}

/// Stops `bar` from drawing while a prompt shares its terminal.
///
/// The bar is hidden for the duration of each question and drawn again on
/// `resume()` afterwards. Bars that are already hidden are left alone.
struct PausingPrompter<'a, F> {
    inner: &'a dyn Prompter,
    bar: ProgressBar,
    resume: F,
}

impl<'a, F> PausingPrompter<'a, F>
where
    F: Fn() -> ProgressDrawTarget + Send + Sync,
{
    async fn paused<T>(&self, question: PromptFuture<'_, T>) -> T {
        if self.bar.is_hidden() {
            return question.await;
        }
        self.bar.set_draw_target(ProgressDrawTarget::hidden());
        // Leave the last drawn bar line before the prompt starts.
        eprintln!();
        let answer = question.await;
        self.bar.set_draw_target((self.resume)());
        self.bar.tick();
        answer
    }
}

impl<'a, F> Prompter for PausingPrompter<'a, F>
where
    F: Fn() -> ProgressDrawTarget + Send + Sync,
{
    fn confirm_overwrite<'b>(&'b self, name: &'b str) -> PromptFuture<'b, Option<OverwriteChoice>> {
        Box::pin(self.paused(self.inner.confirm_overwrite(name)))
    }

    fn input<'b>(&'b self, request: InputRequest<'b>) -> PromptFuture<'b, Option<String>> {
        Box::pin(self.paused(self.inner.input(request)))
    }
}

/// Runs a batch while showing a progress bar on stderr.
pub async fn run_with_progress(
    fs: &dyn HostFs,
    prompter: &dyn Prompter,
    entries: &[SourceEntry],
    destination: &Path,
    cancel: &CancellationToken,
) -> TransferOutcome {
    let (tx, rx) = mpsc::channel(64);
    let bar = ProgressBar::new(entries.len() as u64);
    let renderer = tokio::spawn(render(rx, bar.clone()));

    let outcome = {
        let prompter = PausingPrompter {
            inner: prompter,
            bar,
            resume: ProgressDrawTarget::stderr,
        };
        let engine = BatchTransfer::new(fs, &prompter).with_events(tx);
        engine.run(entries, destination, cancel).await
    };

    let _ = renderer.await;
    outcome
}
