//! Upload helper over the storage service.

use tracing::instrument;

use super::error::AttachmentError;
use super::types::{AttachmentSource, UploadedAttachment};
use crate::storage::AttachmentStorageService;

/// Parse `raw` as a MIME type, falling back to `application/octet-stream`
/// when it is missing or malformed.
#[must_use]
pub fn normalize_mime_type(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}

/// Upload a named file or raw buffer.
///
/// # Errors
///
/// Returns an error if the source has no name or the storage call fails.
#[instrument(skip_all, fields(provider = %storage.provider()))]
pub async fn upload_attachment(
    storage: &AttachmentStorageService,
    source: AttachmentSource,
) -> Result<UploadedAttachment, AttachmentError> {
    let (file_name, bytes, mime_type) = source.into_parts();
    if file_name.trim().is_empty() {
        return Err(AttachmentError::MissingFileName);
    }

    let mime_type = normalize_mime_type(mime_type.as_deref());
    let file_size = bytes.len() as u64;

    let stored = storage
        .upload_file(&file_name, bytes, Some(&mime_type))
        .await?;

    Ok(UploadedAttachment {
        file_name,
        file_path: stored.path,
        file_size,
        mime_type,
        url: stored.url,
    })
}
