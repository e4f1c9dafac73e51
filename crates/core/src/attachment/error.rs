//! Attachment error types.

use thiserror::Error;
use unidata_shared::AppError;

use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The source carried no file name.
    #[error("attachment has no file name")]
    MissingFileName,

    /// Storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::MissingFileName => Self::Validation(err.to_string()),
            AttachmentError::Storage(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_message_passes_through() {
        let err = AttachmentError::from(StorageError::not_found("attachments/a.txt"));
        assert_eq!(err.to_string(), "file not found: attachments/a.txt");
        assert!(matches!(err, AttachmentError::Storage(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = AttachmentError::MissingFileName.into();
        assert_eq!(app.status_code(), 400);

        let app: AppError = AttachmentError::from(StorageError::file_too_large(11, 10)).into();
        assert_eq!(app.status_code(), 413);
    }
}
