use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the notegen library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Nothing was loaded, so there is nothing to send for generation.
    #[error("No material loaded. Add reference notes or a content file first.")]
    EmptyInput,

    /// Adding a batch would push the reference set past its cap.
    #[error("Reference files are limited to {limit} ({current} loaded, {incoming} selected)")]
    OverCapacity {
        /// Documents already in the store
        current: usize,
        /// Documents in the rejected batch
        incoming: usize,
        /// Maximum allowed documents
        limit: usize,
    },

    /// File extension is not accepted for the slot it was offered to.
    #[error("Unsupported format '{name}'. Supported formats: {accepted}")]
    UnsupportedFormat {
        /// Offending file name
        name: String,
        /// Human-readable list of accepted extensions
        accepted: String,
    },

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A vault selection contained no usable markdown files.
    #[error("No markdown files found in '{path}'")]
    NoFiles {
        /// Directory that was scanned
        path: PathBuf,
    },

    /// The completion service answered with an error payload.
    #[error("{message}")]
    Service {
        /// Message reported by the service, verbatim
        message: String,
    },

    /// The request could not be completed.
    #[error("Request failed: {message}")]
    Transport {
        /// Underlying transport message
        message: String,
    },

    /// The service answered with a body that could not be understood.
    #[error("Invalid response from completion service: {message}")]
    InvalidResponse {
        /// Parse failure description
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {secs}s")]
    Timeout {
        /// Timeout in seconds
        secs: u64,
    },

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Writing to the system clipboard failed.
    #[error("Copy to clipboard failed: {message}")]
    Clipboard {
        /// Error message
        message: String,
    },

    /// An action needed a generated article but none exists yet.
    #[error("No article has been generated yet")]
    NoResult,

    /// Export was requested with no content selected.
    #[error("Nothing to export. Load a file or generate an article first.")]
    NothingToExport,

    /// A name that cannot be used as a single file name.
    #[error("Invalid file name '{name}': {reason}")]
    InvalidFileName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// External template failed validation.
    #[error("Invalid template '{path}': {reason}")]
    TemplateValidation {
        /// Template path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: source.to_string(),
        }
    }

    /// Creates a template validation error.
    #[must_use]
    pub fn template_validation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TemplateValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported format error.
    #[must_use]
    pub fn unsupported_format(name: impl Into<String>, accepted: &[&str]) -> Self {
        Self::UnsupportedFormat {
            name: name.into(),
            accepted: accepted
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Creates an invalid file name error.
    #[must_use]
    pub fn invalid_file_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFileName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a no files error.
    #[must_use]
    pub fn no_files(path: impl Into<PathBuf>) -> Self {
        Self::NoFiles { path: path.into() }
    }

    /// Creates a service error carrying the service's own message.
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a clipboard error.
    #[must_use]
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true for every way a generation request can fail once issued.
    #[must_use]
    pub const fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::Service { .. }
                | Self::Transport { .. }
                | Self::InvalidResponse { .. }
                | Self::Timeout { .. }
                | Self::Cancelled
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = Error::config("model must not be empty");
        assert!(err.is_config());
        assert!(err.to_string().contains("model must not be empty"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.md", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.md"));
    }

    #[test]
    fn test_service_message_is_verbatim() {
        let err = Error::service("rate limited");
        assert_eq!(err.to_string(), "rate limited");
        assert!(err.is_generation_failure());
    }

    #[test]
    fn test_unsupported_format_lists_extensions() {
        let err = Error::unsupported_format("photo.png", &["txt", "md"]);
        assert_eq!(
            err.to_string(),
            "Unsupported format 'photo.png'. Supported formats: .txt, .md"
        );
    }

    #[test]
    fn test_generation_failure_category() {
        assert!(Error::transport("connection reset").is_generation_failure());
        assert!(Error::Timeout { secs: 5 }.is_generation_failure());
        assert!(Error::Cancelled.is_generation_failure());
        assert!(!Error::EmptyInput.is_generation_failure());
        assert!(!Error::clipboard("no display").is_generation_failure());
    }

    #[test]
    fn test_over_capacity_message() {
        let err = Error::OverCapacity {
            current: 48,
            incoming: 3,
            limit: 50,
        };
        assert!(err.to_string().contains("limited to 50"));
    }
}
