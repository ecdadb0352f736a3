//! Picker surface session: serves the page, waits for submitted batches
//! and runs each one through the transfer engine.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use ezupload_file_ops::HostFs;
use ezupload_picker_server::{
    Handler, HandlerFuture, PageServer, PickerServer, Sender, ServerConfig,
};
use ezupload_protocol::PickedFile;
use ezupload_transfer::{
    BufferedSource, Notice, Prompter, SourceProvider, should_dismiss_surface, summarize,
    surface_reply,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::progress::run_with_progress;

/// Where the page and channel listen.
#[derive(Debug, Clone)]
pub struct PickerSettings {
    pub bind: IpAddr,
    pub page_port: u16,
    pub channel_port: u16,
}

/// What the surface did, forwarded out of the connection's read pump.
enum SurfaceEvent {
    Upload { files: Vec<PickedFile>, sender: Sender },
    ReadError(String),
    Disconnected,
}

/// Hands surface messages to the session loop without blocking the pump.
struct Bridge {
    tx: mpsc::Sender<SurfaceEvent>,
}

impl Handler for Bridge {
    fn on_upload(&self, sender: Sender, files: Vec<PickedFile>) -> HandlerFuture<'_> {
        Box::pin(async move {
            let _ = self.tx.send(SurfaceEvent::Upload { files, sender }).await;
        })
    }

    fn on_read_error(&self, _sender: Sender, message: String) -> HandlerFuture<'_> {
        Box::pin(async move {
            let _ = self.tx.send(SurfaceEvent::ReadError(message)).await;
        })
    }

    fn on_disconnected(&self) -> HandlerFuture<'_> {
        Box::pin(async move {
            let _ = self.tx.send(SurfaceEvent::Disconnected).await;
        })
    }
}

/// A running picker surface.
pub struct PickerSession {
    channel: Arc<PickerServer<Bridge>>,
    page_addr: SocketAddr,
    page_cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    events: mpsc::Receiver<SurfaceEvent>,
}

impl PickerSession {
    /// Binds both listeners and starts serving.
    pub async fn start(settings: &PickerSettings) -> anyhow::Result<Self> {
        let (tx, events) = mpsc::channel(8);

        let channel = PickerServer::bind(
            ServerConfig {
                bind: settings.bind,
                port: settings.channel_port,
            },
            Bridge { tx },
        )
        .await
        .with_context(|| format!("failed to bind picker channel on port {}", settings.channel_port))?;

        let page = PageServer::bind(
            &ServerConfig {
                bind: settings.bind,
                port: settings.page_port,
            },
            channel.port(),
            channel.token(),
        )
        .await
        .with_context(|| format!("failed to bind picker page on port {}", settings.page_port))?;
        let page_addr = page.local_addr()?;
        channel.allow_page_port(page_addr.port());

        let page_cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        let channel_run = Arc::clone(&channel);
        tasks.push(tokio::spawn(async move {
            if let Err(e) = channel_run.run().await {
                tracing::error!("picker channel error: {e}");
            }
        }));

        let page_run_cancel = page_cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = page.run(page_run_cancel).await {
                tracing::error!("picker page error: {e}");
            }
        }));

        Ok(Self {
            channel,
            page_addr,
            page_cancel,
            tasks,
            events,
        })
    }

    /// URL of the picker page.
    pub fn page_url(&self) -> String {
        format!("http://{}/", self.page_addr)
    }

    /// Port of the picker page.
    pub fn page_port(&self) -> u16 {
        self.page_addr.port()
    }

    /// Port of the message channel.
    pub fn channel_port(&self) -> u16 {
        self.channel.port()
    }

    /// Processes submitted batches until one finishes cleanly or `cancel`
    /// fires, then dismisses the surface.
    ///
    /// A batch interrupted by `cancel` is answered with `uploadError`
    /// carrying the cancellation notice, and the session ends right after:
    /// cancelling stops the whole run, not just the batch.
    pub async fn serve(
        mut self,
        fs: &dyn HostFs,
        prompter: &dyn Prompter,
        destination: &Path,
        cancel: &CancellationToken,
        mut notify: impl FnMut(Notice),
    ) -> anyhow::Result<()> {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("picker session cancelled");
                    break;
                }
                event = self.events.recv() => event,
            };

            match event {
                Some(SurfaceEvent::Upload { files, sender }) => {
                    let entries = BufferedSource::new(files).produce().await?;
                    let outcome = run_with_progress(fs, prompter, &entries, destination, cancel).await;

                    if sender.send(&surface_reply(&outcome)).is_err() {
                        tracing::warn!("surface went away before the reply");
                    }
                    notify(summarize(&outcome));

                    if should_dismiss_surface(&outcome) {
                        break;
                    }
                    if cancel.is_cancelled() {
                        tracing::info!("batch cancelled, ending picker session");
                        break;
                    }
                }
                Some(SurfaceEvent::ReadError(message)) => notify(Notice::error(message)),
                Some(SurfaceEvent::Disconnected) => {
                    tracing::info!("surface disconnected, waiting for it to reconnect");
                }
                None => break,
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(self) {
        let Self {
            channel,
            page_cancel,
            tasks,
            events,
            ..
        } = self;
        // Disconnect callbacks must not wait on a loop that has ended.
        drop(events);

        channel.disconnect_picker().await;
        channel.shutdown();
        page_cancel.cancel();
        for task in tasks {
            let _ = task.await;
        }
        tracing::debug!("picker surface dismissed");
    }
}
