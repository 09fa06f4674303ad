//! Error types for the management layer

use thiserror::Error;

/// Result type alias for management operations
pub type AdminResult<T> = Result<T, AdminError>;

/// Errors raised while driving a management page
#[derive(Error, Debug)]
pub enum AdminError {
    /// Failure reported by the client or core layer
    #[error(transparent)]
    Core(#[from] studio_core::Error),

    /// The user refused a confirmation prompt
    #[error("{action} was cancelled")]
    Declined {
        /// What was about to happen
        action: String,
    },

    /// `submit` was called with no open form
    #[error("No {label} form is open")]
    NoEditor {
        /// Resource label
        label: &'static str,
    },

    /// The id does not belong to the loaded collection
    #[error("{label} '{id}' is not in the list")]
    Missing {
        /// Resource label
        label: &'static str,
        /// Requested id
        id: String,
    },

    /// An upload was requested before a file was selected
    #[error("Select an image before uploading")]
    NothingToUpload,
}

impl AdminError {
    /// Create a missing-entity error
    pub fn missing(label: &'static str, id: impl Into<String>) -> Self {
        Self::Missing {
            label,
            id: id.into(),
        }
    }

    /// Whether the backend rejected the stored credentials
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Core(err) if err.is_unauthorized())
    }
}
