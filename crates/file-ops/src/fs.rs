//! The host filesystem contract and its local implementation.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::FsError;

/// A boxed future returned by [`HostFs`] methods.
pub type FsFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FsError>> + Send + 'a>>;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Other,
}

/// Result of a successful `stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub size: u64,
}

/// Filesystem operations the transfer engine relies on.
pub trait HostFs: Send + Sync {
    /// Returns metadata for `path`, or [`FsError::NotFound`].
    fn stat<'a>(&'a self, path: &'a Path) -> FsFuture<'a, FileStat>;

    /// Writes `data` to `path`, creating or truncating it.
    fn write_file<'a>(&'a self, path: &'a Path, data: &'a [u8]) -> FsFuture<'a, ()>;

    /// Copies `src` to `dst`. Fails if `dst` exists and `overwrite` is false.
    fn copy<'a>(&'a self, src: &'a Path, dst: &'a Path, overwrite: bool) -> FsFuture<'a, ()>;

    /// Joins a file name onto a directory.
    fn join_path(&self, base: &Path, name: &str) -> PathBuf {
        base.join(name)
    }
}

/// [`HostFs`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl HostFs for LocalFs {
    fn stat<'a>(&'a self, path: &'a Path) -> FsFuture<'a, FileStat> {
        Box::pin(async move {
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|e| map_not_found(e, path))?;
            let kind = if meta.is_dir() {
                FileKind::Directory
            } else if meta.is_file() {
                FileKind::File
            } else {
                FileKind::Other
            };
            Ok(FileStat {
                kind,
                size: meta.len(),
            })
        })
    }

    fn write_file<'a>(&'a self, path: &'a Path, data: &'a [u8]) -> FsFuture<'a, ()> {
        Box::pin(async move {
            tokio::fs::write(path, data).await?;
            tracing::debug!(path = %path.display(), bytes = data.len(), "file written");
            Ok(())
        })
    }

    fn copy<'a>(&'a self, src: &'a Path, dst: &'a Path, overwrite: bool) -> FsFuture<'a, ()> {
        Box::pin(async move {
            if !overwrite && tokio::fs::try_exists(dst).await.unwrap_or(false) {
                return Err(FsError::AlreadyExists(dst.to_path_buf()));
            }
            let bytes = tokio::fs::copy(src, dst)
                .await
                .map_err(|e| map_not_found(e, src))?;
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                bytes,
                "file copied"
            );
            Ok(())
        })
    }
}

fn map_not_found(err: std::io::Error, path: &Path) -> FsError {
    if err.kind() == ErrorKind::NotFound {
        FsError::NotFound(path.to_path_buf())
    } else {
        FsError::Io(err)
    }
}
