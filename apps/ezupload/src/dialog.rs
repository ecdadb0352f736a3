//! Native file dialog.

use std::path::PathBuf;

use ezupload_transfer::{DialogOptions, FileDialog, PromptFuture};

/// [`FileDialog`] backed by the platform dialog (XDG portal on Linux).
pub struct NativeDialog;

impl FileDialog for NativeDialog {
    fn pick_files<'a>(&'a self, options: &'a DialogOptions) -> PromptFuture<'a, Option<Vec<PathBuf>>> {
        let title = options.title.clone();
        let many = options.can_select_many;
        Box::pin(async move {
            // The platform dialog blocks its thread until closed.
            let picked = tokio::task::spawn_blocking(move || {
                let dialog = rfd::FileDialog::new().set_title(title.as_str());
                if many {
                    dialog.pick_files()
                } else {
                    dialog.pick_file().map(|p| vec![p])
                }
            })
            .await;

            match picked {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::error!("file dialog task failed: {e}");
                    None
                }
            }
        })
    }
}
