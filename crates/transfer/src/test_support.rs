//! In-memory fakes shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ezupload_file_ops::{FileKind, FileStat, FsError, FsFuture, HostFs};
use tokio_util::sync::CancellationToken;

use crate::prompt::{InputRequest, OverwriteChoice, PromptFuture, Prompter};

/// Filesystem held in maps, with failure and cancellation hooks.
#[derive(Default)]
pub(crate) struct MemFs {
    pub files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    pub dirs: Mutex<HashSet<PathBuf>>,
    pub failing: Mutex<HashSet<PathBuf>>,
    pub writes: Mutex<Vec<PathBuf>>,
    /// Cancels the token once this many writes have succeeded.
    pub cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), data.to_vec());
        self
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.dirs.lock().unwrap().insert(PathBuf::from(path));
        self
    }

    pub fn failing_on(self, path: &str) -> Self {
        self.failing.lock().unwrap().insert(PathBuf::from(path));
        self
    }

    pub fn cancel_after(self, writes: usize, token: CancellationToken) -> Self {
        *self.cancel_after.lock().unwrap() = Some((writes, token));
        self
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.writes.lock().unwrap().clone()
    }

    fn store(&self, path: &Path, data: Vec<u8>) -> Result<(), FsError> {
        if self.failing.lock().unwrap().contains(path) {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        self.files.lock().unwrap().insert(path.to_path_buf(), data);
        let mut writes = self.writes.lock().unwrap();
        writes.push(path.to_path_buf());
        if let Some((after, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if writes.len() >= *after {
                token.cancel();
            }
        }
        Ok(())
    }
}

impl HostFs for MemFs {
    fn stat<'a>(&'a self, path: &'a Path) -> FsFuture<'a, FileStat> {
        Box::pin(async move {
            if self.dirs.lock().unwrap().contains(path) {
                return Ok(FileStat {
                    kind: FileKind::Directory,
                    size: 0,
                });
            }
            match self.files.lock().unwrap().get(path) {
                Some(data) => Ok(FileStat {
                    kind: FileKind::File,
                    size: data.len() as u64,
                }),
                None => Err(FsError::NotFound(path.to_path_buf())),
            }
        })
    }

    fn write_file<'a>(&'a self, path: &'a Path, data: &'a [u8]) -> FsFuture<'a, ()> {
        Box::pin(async move { self.store(path, data.to_vec()) })
    }

    fn copy<'a>(&'a self, src: &'a Path, dst: &'a Path, overwrite: bool) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let data = self
                .files
                .lock()
                .unwrap()
                .get(src)
                .cloned()
                .ok_or_else(|| FsError::NotFound(src.to_path_buf()))?;
            if !overwrite && self.files.lock().unwrap().contains_key(dst) {
                return Err(FsError::AlreadyExists(dst.to_path_buf()));
            }
            self.store(dst, data)
        })
    }
}

/// Prompter answering from queues and recording what it was asked.
#[derive(Default)]
pub(crate) struct ScriptedPrompter {
    overwrite_answers: Mutex<VecDeque<Option<OverwriteChoice>>>,
    input_answers: Mutex<VecDeque<Option<String>>>,
    pub asked: Mutex<Vec<String>>,
    pub shown_values: Mutex<Vec<String>>,
    pub shown_errors: Mutex<Vec<Option<String>>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[Option<OverwriteChoice>]) -> Self {
        let p = Self::new();
        p.overwrite_answers
            .lock()
            .unwrap()
            .extend(answers.iter().copied());
        p
    }

    pub fn typing(answers: &[Option<&str>]) -> Self {
        let p = Self::new();
        p.input_answers
            .lock()
            .unwrap()
            .extend(answers.iter().map(|a| a.map(String::from)));
        p
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_overwrite<'a>(&'a self, name: &'a str) -> PromptFuture<'a, Option<OverwriteChoice>> {
        Box::pin(async move {
            self.asked.lock().unwrap().push(name.to_string());
            self.overwrite_answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(None)
        })
    }

    fn input<'a>(&'a self, request: InputRequest<'a>) -> PromptFuture<'a, Option<String>> {
        Box::pin(async move {
            self.shown_values
                .lock()
                .unwrap()
                .push(request.value.to_string());
            self.shown_errors
                .lock()
                .unwrap()
                .push(request.error.map(String::from));
            self.input_answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(None)
        })
    }
}
