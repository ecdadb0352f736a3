//! Execution environment check: can a native dialog see the user's files?

use serde::{Deserialize, Serialize};

/// Variables set by SSH sessions and remote development containers.
const REMOTE_VARS: [&str; 5] = [
    "SSH_CONNECTION",
    "SSH_CLIENT",
    "SSH_TTY",
    "REMOTE_CONTAINERS",
    "CODESPACES",
];

/// Which source provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Decide from the environment on every invocation.
    #[default]
    Auto,
    /// Always use the native file dialog.
    Native,
    /// Always use the browser picker surface.
    Picker,
}

/// Snapshot of the facts the environment check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    remote_session: bool,
    has_display: bool,
}

impl Environment {
    /// Reads the current process environment.
    ///
    /// Not cached: the environment can change between invocations.
    pub fn detect() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a snapshot from a variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        let remote_session = REMOTE_VARS.iter().any(|key| set(key));

        // Only X11/Wayland systems can be headless in a way that hides dialogs.
        let has_display = if cfg!(any(target_os = "windows", target_os = "macos")) {
            true
        } else {
            set("DISPLAY") || set("WAYLAND_DISPLAY")
        };

        Self {
            remote_session,
            has_display,
        }
    }

    /// Returns `true` when the files the user wants to send live on a
    /// different machine than this process (or no local dialog can show).
    pub fn is_remote(&self) -> bool {
        self.remote_session || !self.has_display
    }

    /// Returns `true` if the picker surface should be used for `mode`.
    pub fn use_picker(&self, mode: TransferMode) -> bool {
        match mode {
            TransferMode::Auto => self.is_remote(),
            TransferMode::Native => false,
            TransferMode::Picker => true,
        }
    }
}
