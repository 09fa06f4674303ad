//! Error types for the studio content admin

use std::{error::Error as StdError, fmt};

/// Main error type shared by every studio crate
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// Client-side validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The backend answered with a non-success status
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, or the status reason
        message: String,
    },

    /// The request never produced a response
    Network(String),

    /// Timeout error
    Timeout {
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// Rejected credentials
    Authentication(String),

    /// No credentials stored yet
    NotLoggedIn,

    /// Not found error
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// File size error
    FileSizeExceeded {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max_size: u64,
    },

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error for `field`
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the backend rejected the stored credentials
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Http { status: 401, .. })
    }

    /// Whether the failure is a client-side validation failure
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::FileSizeExceeded { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::Http { status, message } => write!(f, "Request failed ({status}): {message}"),
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Timeout { duration_ms } => {
                write!(f, "Operation timed out after {duration_ms}ms")
            }
            Self::Authentication(msg) => write!(f, "Authentication failed: {msg}"),
            Self::NotLoggedIn => write!(f, "Not logged in"),
            Self::NotFound { resource } => write!(f, "Resource not found: {resource}"),
            Self::FileSizeExceeded { size, max_size } => {
                write!(f, "File size {size} exceeds maximum of {max_size}")
            }
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

// From implementations for automatic conversions
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::uninlined_format_args
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "session file missing");
        let app_error = Error::from(io_error);

        assert!(matches!(app_error, Error::Io(_)));
        assert!(app_error.to_string().contains("I/O error"));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_http_error_display() {
        let error = Error::Http {
            status: 422,
            message: "title is required".to_string(),
        };

        assert_eq!(error.to_string(), "Request failed (422): title is required");
    }

    #[test]
    fn test_validation_constructor() {
        let error = Error::validation("email", "Please enter a valid email address");

        assert_eq!(
            error.to_string(),
            "Validation error: email - Please enter a valid email address"
        );
        assert!(error.is_validation());
        assert!(!error.is_unauthorized());
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(Error::Authentication("no token".to_string()).is_unauthorized());
        assert!(!Error::NotLoggedIn.is_unauthorized());
        assert!(
            Error::Http {
                status: 401,
                message: "expired".to_string()
            }
            .is_unauthorized()
        );
        assert!(
            !Error::Http {
                status: 403,
                message: "forbidden".to_string()
            }
            .is_unauthorized()
        );
    }

    #[test]
    fn test_file_size_exceeded_error() {
        let error = Error::FileSizeExceeded {
            size: 3 * 1024 * 1024,
            max_size: 2 * 1024 * 1024,
        };

        assert_eq!(error.to_string(), "File size 3145728 exceeds maximum of 2097152");
        assert!(error.is_validation());
    }

    #[test]
    fn test_serialization_error_source() {
        let json_error = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let app_error = Error::from(json_error);

        assert!(matches!(app_error, Error::Serialization(_)));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_all_error_display_variants() {
        let test_cases = vec![
            (Error::Io(io::Error::other("disk")), "I/O error:"),
            (
                Error::Configuration {
                    message: "bad url".to_string(),
                },
                "Configuration error: bad url",
            ),
            (Error::Network("refused".to_string()), "Network error: refused"),
            (Error::Timeout { duration_ms: 5000 }, "Operation timed out after 5000ms"),
            (
                Error::NotFound {
                    resource: "gallery/42".to_string(),
                },
                "Resource not found: gallery/42",
            ),
            (Error::Other("other error".to_string()), "other error"),
        ];

        for (error, expected) in test_cases {
            let display = error.to_string();
            assert!(
                display.contains(expected),
                "Error display '{}' should contain '{}'",
                display,
                expected
            );
        }
    }
}
