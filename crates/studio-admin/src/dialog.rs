//! Modal primitives: plain dialog, confirmation and error dialogs
//!
//! These hold only open/close state and the data a dialog carries. The
//! [`Confirm`] trait is how destructive operations ask the user.

use std::fmt;

/// Something that can ask the user a yes/no question
pub trait Confirm: Send + Sync {
    /// Ask `message`; `true` means go ahead
    fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer, for scripted use and tests
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Generic dialog with a title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dialog {
    open: bool,
    title: String,
}

impl Dialog {
    /// Open with `title`
    pub fn open(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.open = true;
    }

    /// Close
    pub const fn close(&mut self) {
        self.open = false;
    }

    /// Whether the dialog is showing
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Current title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Confirmation dialog holding the action it guards
///
/// [`ConfirmDialog::confirm`] hands the action out exactly once, so a
/// double click cannot run it twice.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfirmDialog<A> {
    message: String,
    pending: Option<A>,
}

impl<A> Default for ConfirmDialog<A> {
    fn default() -> Self {
        Self {
            message: String::new(),
            pending: None,
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for ConfirmDialog<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmDialog")
            .field("message", &self.message)
            .field("pending", &self.pending)
            .finish()
    }
}

impl<A> ConfirmDialog<A> {
    /// Open the dialog for `action`, replacing any earlier request
    pub fn request(&mut self, message: impl Into<String>, action: A) {
        self.message = message.into();
        self.pending = Some(action);
    }

    /// Accept: close and return the guarded action
    pub fn confirm(&mut self) -> Option<A> {
        self.message.clear();
        self.pending.take()
    }

    /// Decline: close and drop the action
    pub fn cancel(&mut self) {
        self.message.clear();
        self.pending = None;
    }

    /// Whether the dialog is showing
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Prompt text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The action awaiting confirmation
    #[must_use]
    pub const fn pending(&self) -> Option<&A> {
        self.pending.as_ref()
    }
}

/// Error dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDialog {
    message: Option<String>,
}

impl ErrorDialog {
    /// Closed dialog
    #[must_use]
    pub const fn new() -> Self {
        Self { message: None }
    }

    /// Show `message`
    pub fn show(&mut self, message: impl fmt::Display) {
        self.message = Some(message.to_string());
    }

    /// Close
    pub fn dismiss(&mut self) {
        self.message = None;
    }

    /// Whether the dialog is showing
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.message.is_some()
    }

    /// The error being shown
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
