//! Modal questions the workflow asks the user.
//!
//! The host decides how they are shown (terminal, native message box, ...);
//! the workflow only sees the answers.

use std::future::Future;
use std::pin::Pin;

/// A boxed future returned by [`Prompter`] methods.
pub type PromptFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Buttons of the "already exists" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteChoice {
    Overwrite,
    Skip,
}

/// An editable single-line text prompt.
#[derive(Debug, Clone, Copy)]
pub struct InputRequest<'a> {
    pub title: &'a str,
    pub prompt: &'a str,
    /// Pre-filled value; the cursor starts at its end.
    pub value: &'a str,
    /// Why the previous answer was rejected, if it was.
    pub error: Option<&'a str>,
}

/// Host-provided modal prompts.
pub trait Prompter: Send + Sync {
    /// Asks whether to overwrite `name`. `None` means the prompt was
    /// dismissed without picking a button.
    fn confirm_overwrite<'a>(&'a self, name: &'a str) -> PromptFuture<'a, Option<OverwriteChoice>>;

    /// Shows an editable text prompt. `None` means the prompt was cancelled.
    fn input<'a>(&'a self, request: InputRequest<'a>) -> PromptFuture<'a, Option<String>>;
}
