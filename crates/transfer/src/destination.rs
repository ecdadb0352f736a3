//! Destination directory resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::TransferError;
use crate::types::TransferRequest;

/// The document the user is currently working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveDocument {
    /// Backed by a real filesystem path.
    File(PathBuf),
    /// Virtual or untitled; carries the raw URI.
    Virtual(String),
}

impl ActiveDocument {
    /// Parses a document URI or plain path.
    ///
    /// `file://` URIs and bare paths are files. Anything else with a URI
    /// scheme (`untitled:Untitled-1`, `vscode-remote://...`) is virtual.
    /// Single-letter schemes are Windows drive letters, not schemes.
    pub fn parse(uri: &str) -> Self {
        if let Some(rest) = uri.strip_prefix("file://") {
            return ActiveDocument::File(file_uri_path(rest));
        }
        match uri.split_once(':') {
            Some((scheme, _)) if is_uri_scheme(scheme) => ActiveDocument::Virtual(uri.to_string()),
            _ => ActiveDocument::File(PathBuf::from(uri)),
        }
    }
}

/// Converts the part of a `file://` URI after the scheme into a path.
///
/// Percent-escapes are decoded, a query or fragment is dropped, and
/// `/C:/...` loses its leading slash. A host other than `localhost` names
/// a UNC share (`//host/share/...`).
fn file_uri_path(rest: &str) -> PathBuf {
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let path = match decoded.strip_prefix('/') {
        Some(tail) if has_drive_letter(tail) => tail,
        _ => decoded.as_ref(),
    };

    if authority.is_empty() || authority.eq_ignore_ascii_case("localhost") {
        PathBuf::from(path)
    } else {
        let host = percent_decode_str(authority).decode_utf8_lossy();
        PathBuf::from(format!("//{host}{path}"))
    }
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/')
}

fn is_uri_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    candidate.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Host state the resolver consults.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
    pub active_document: Option<ActiveDocument>,
    /// Open workspace roots, in order.
    pub workspace_roots: Vec<PathBuf>,
}

/// Picks the directory a transfer targets.
///
/// Priority: explicit destination > parent of the active file (real files
/// only) > first workspace root.
pub struct DestinationResolver<'a> {
    host: &'a HostContext,
}

impl<'a> DestinationResolver<'a> {
    pub fn new(host: &'a HostContext) -> Self {
        Self { host }
    }

    /// Resolves the destination, or fails with [`TransferError::NoDestination`].
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<TransferRequest, TransferError> {
        if let Some(dir) = explicit {
            return Ok(TransferRequest {
                destination: dir.to_path_buf(),
                explicit: true,
            });
        }

        let inferred = self
            .active_parent()
            .or_else(|| self.host.workspace_roots.first().cloned())
            .ok_or(TransferError::NoDestination)?;

        Ok(TransferRequest {
            destination: inferred,
            explicit: false,
        })
    }

    fn active_parent(&self) -> Option<PathBuf> {
        match self.host.active_document.as_ref()? {
            ActiveDocument::File(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => Some(parent.to_path_buf()),
                _ => Some(PathBuf::from(".")),
            },
            ActiveDocument::Virtual(uri) => {
                tracing::debug!(%uri, "active document is virtual, ignoring");
                None
            }
        }
    }
}
