//! Attachment upload helper.
//!
//! Adapts a browser-style named file or a raw buffer into a single call on
//! [`AttachmentStorageService`](crate::storage::AttachmentStorageService).

mod error;
mod service;
mod types;

pub use error::AttachmentError;
pub use service::{normalize_mime_type, upload_attachment};
pub use types::{AttachmentSource, UploadedAttachment};
