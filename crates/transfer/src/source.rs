//! Source providers: where the files of a batch come from.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use ezupload_protocol::PickedFile;

use crate::TransferError;
use crate::prompt::PromptFuture;
use crate::types::SourceEntry;

/// A boxed future returned by [`SourceProvider::produce`].
pub type SourceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<SourceEntry>, TransferError>> + Send + 'a>>;

/// Yields the entries of one batch.
///
/// An empty list means the user backed out; the caller stops without
/// reporting anything.
pub trait SourceProvider: Send {
    fn produce(&mut self) -> SourceFuture<'_>;
}

/// Options for a native "open files" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    pub title: String,
    pub open_label: String,
    pub can_select_files: bool,
    pub can_select_folders: bool,
    pub can_select_many: bool,
}

impl DialogOptions {
    /// Multi-select, files only.
    pub fn upload() -> Self {
        Self {
            title: "Select Files to Upload".into(),
            open_label: "Upload".into(),
            can_select_files: true,
            can_select_folders: false,
            can_select_many: true,
        }
    }
}

/// A host-native file chooser.
pub trait FileDialog: Send + Sync {
    /// Shows the dialog. `None` means it was cancelled.
    fn pick_files<'a>(&'a self, options: &'a DialogOptions) -> PromptFuture<'a, Option<Vec<PathBuf>>>;
}

/// Entries chosen through a native dialog, as paths.
pub struct NativeSource<'a> {
    dialog: &'a dyn FileDialog,
}

impl<'a> NativeSource<'a> {
    pub fn new(dialog: &'a dyn FileDialog) -> Self {
        Self { dialog }
    }
}

impl SourceProvider for NativeSource<'_> {
    fn produce(&mut self) -> SourceFuture<'_> {
        Box::pin(async move {
            let options = DialogOptions::upload();
            let Some(paths) = self.dialog.pick_files(&options).await else {
                tracing::debug!("file dialog cancelled");
                return Ok(Vec::new());
            };
            tracing::debug!(count = paths.len(), "files selected");
            Ok(paths
                .into_iter()
                .map(|source| SourceEntry::Path { source })
                .collect())
        })
    }
}

/// Entries submitted by the picker surface, already in memory.
///
/// Yields its files once; later calls return an empty batch.
pub struct BufferedSource {
    files: Vec<PickedFile>,
}

impl BufferedSource {
    pub fn new(files: Vec<PickedFile>) -> Self {
        Self { files }
    }
}

impl SourceProvider for BufferedSource {
    fn produce(&mut self) -> SourceFuture<'_> {
        let files = std::mem::take(&mut self.files);
        Box::pin(async move {
            Ok(files
                .into_iter()
                .map(|f| SourceEntry::Buffer {
                    name: f.name,
                    bytes: f.data,
                })
                .collect())
        })
    }
}
