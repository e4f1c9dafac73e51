//! Attachment types and data structures.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// What the caller is uploading.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    /// A browser-style file: it carries its own name and type.
    /// Browsers report an unknown type as the empty string.
    File {
        /// File name as reported by the client.
        name: String,
        /// Reported MIME type.
        content_type: String,
        /// File content.
        bytes: Bytes,
    },
    /// A raw buffer with an explicit name.
    Buffer {
        /// Target file name.
        file_name: String,
        /// File content.
        bytes: Bytes,
        /// MIME type, if known.
        mime_type: Option<String>,
    },
}

impl AttachmentSource {
    /// A browser-style file.
    pub fn file(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self::File {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// A raw buffer.
    pub fn buffer(
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
        mime_type: Option<String>,
    ) -> Self {
        Self::Buffer {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type,
        }
    }

    /// Split into `(file_name, bytes, mime_type)`.
    #[must_use]
    pub fn into_parts(self) -> (String, Bytes, Option<String>) {
        match self {
            Self::File {
                name,
                content_type,
                bytes,
            } => (name, bytes, Some(content_type)),
            Self::Buffer {
                file_name,
                bytes,
                mime_type,
            } => (file_name, bytes, mime_type),
        }
    }
}

/// A stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAttachment {
    /// Name the caller used.
    pub file_name: String,
    /// Provider-relative key, always under `attachments/`.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Normalized MIME type the object was stored with.
    pub mime_type: String,
    /// Direct object URL (MinIO and S3 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
