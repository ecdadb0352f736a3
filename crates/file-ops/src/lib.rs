//! Host filesystem primitives for batch transfers.
//!
//! The transfer engine only talks to the filesystem through [`HostFs`]:
//! `stat`, `write_file`, `copy` and `join_path`. Each call is treated as
//! atomic from the caller's point of view and may fail with an opaque
//! message. [`LocalFs`] implements the contract on top of `tokio::fs`.

mod fs;
mod paths;

pub use fs::{FileKind, FileStat, FsFuture, HostFs, LocalFs};
pub use paths::{expand_home, home_dir};

/// Errors produced by filesystem primitives.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("file already exists: {0}")]
    AlreadyExists(std::path::PathBuf),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
