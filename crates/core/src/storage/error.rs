//! Storage error types.

use thiserror::Error;
use unidata_shared::AppError;

use super::config::ProviderKind;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File name is empty or escapes the attachments namespace.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// MIME type not allowed.
    #[error("MIME type '{mime_type}' is not allowed")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// File not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presigned public URLs are not available for this provider.
    #[error("Public URLs not supported for provider: {provider}")]
    PublicUrlNotSupported {
        /// The configured provider.
        provider: ProviderKind,
    },

    /// Provider name not recognised.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Requested URL lifetime is out of range.
    #[error("invalid expiry of {secs} seconds: must be between 1 and {max}")]
    InvalidExpiry {
        /// Requested lifetime.
        secs: u64,
        /// Largest accepted lifetime.
        max: u64,
    },

    /// Rename copied the object but could not finish, so both paths exist
    /// or the copy could not be confirmed.
    #[error("rename of {from} to {to} incomplete: {reason}")]
    RenameIncomplete {
        /// Source key.
        from: String,
        /// Destination key.
        to: String,
        /// What went wrong.
        reason: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Could not connect or authenticate.
    #[error("storage connection failed: {0}")]
    Connection(String),

    /// Provider operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create an invalid file name error.
    #[must_use]
    pub fn invalid_file_name(msg: impl Into<String>) -> Self {
        Self::InvalidFileName(msg.into())
    }

    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid MIME type error.
    #[must_use]
    pub fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a rename incomplete error.
    #[must_use]
    pub fn rename_incomplete(
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RenameIncomplete {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            opendal::ErrorKind::PermissionDenied => Self::Connection(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::TimedOut => Self::Connection(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let msg = err.to_string();
        match err {
            StorageError::InvalidFileName(_)
            | StorageError::InvalidMimeType { .. }
            | StorageError::InvalidExpiry { .. } => Self::Validation(msg),
            StorageError::FileTooLarge { .. } => Self::PayloadTooLarge(msg),
            StorageError::NotFound { .. } => Self::NotFound(msg),
            StorageError::PublicUrlNotSupported { .. } | StorageError::UnsupportedProvider(_) => {
                Self::Unsupported(msg)
            }
            StorageError::RenameIncomplete { .. } => Self::Conflict(msg),
            StorageError::Connection(_) | StorageError::Operation(_) => Self::ExternalService(msg),
            StorageError::Configuration(_) => Self::Internal(msg),
        }
    }
}
