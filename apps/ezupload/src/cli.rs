//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use ezupload_transfer::TransferMode;

/// Upload files into a folder, from this machine or through a browser.
#[derive(Debug, Parser)]
#[command(name = "ezupload", version, about)]
pub struct Cli {
    /// Destination folder. When given, the folder is used as-is unless
    /// `confirm_context_menu_upload` is set.
    pub destination: Option<PathBuf>,

    /// URI or path of the document currently open in the editor.
    #[arg(long, value_name = "URI")]
    pub active_file: Option<String>,

    /// Workspace root (repeatable). Defaults to the current directory.
    #[arg(long = "workspace", value_name = "DIR")]
    pub workspaces: Vec<PathBuf>,

    /// Always use the native file dialog.
    #[arg(long, conflicts_with = "picker")]
    pub native: bool,

    /// Always use the browser picker.
    #[arg(long)]
    pub picker: bool,

    /// Configuration file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Source mode forced on the command line, if any.
    pub fn mode(&self) -> Option<TransferMode> {
        if self.native {
            Some(TransferMode::Native)
        } else if self.picker {
            Some(TransferMode::Picker)
        } else {
            None
        }
    }
}
