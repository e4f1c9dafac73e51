//! Attachment storage service: one configured backend behind a stable API.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::backend::{ObjectDownload, PresignedUrl, StorageBackend, StoredObject, create_backend};
use super::config::{AttachmentStorageConfig, ProviderKind, StorageLimits};
use super::error::StorageError;
use super::key::object_key;

/// Content type used when the caller supplies none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Longest presigned URL lifetime accepted: 7 days, the SigV4 ceiling.
pub const MAX_PUBLIC_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Storage service for file attachments.
///
/// Callers pass bare file names; every object lands under `attachments/`.
pub struct AttachmentStorageService {
    backend: Box<dyn StorageBackend>,
    limits: StorageLimits,
}

impl AttachmentStorageService {
    /// Create a service from configuration, selecting the backend once.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or the backend
    /// cannot be built.
    pub fn from_config(config: &AttachmentStorageConfig) -> Result<Self, StorageError> {
        let backend = create_backend(config)?;
        info!(provider = %config.provider, "attachment storage ready");
        Ok(Self {
            backend,
            limits: config.limits.clone(),
        })
    }

    /// Create a service over an existing backend.
    #[must_use]
    pub fn with_backend(backend: impl StorageBackend + 'static, limits: StorageLimits) -> Self {
        Self {
            backend: Box::new(backend),
            limits,
        }
    }

    /// The active provider.
    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.backend.provider()
    }

    /// Upload limits in force.
    #[must_use]
    pub fn limits(&self) -> &StorageLimits {
        &self.limits
    }

    /// Validate an upload against the configured limits.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.limits.max_file_size {
            return Err(StorageError::file_too_large(size, self.limits.max_file_size));
        }

        if !self.limits.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Store `content` as `attachments/{file_name}`, overwriting any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name, a rejected size or type, or a
    /// provider failure.
    pub async fn upload_file(
        &self,
        file_name: &str,
        content: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        let content = content.into();
        let key = object_key(file_name)?;
        let content_type = content_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let size = content.len() as u64;

        self.validate_upload(content_type, size)?;

        let stored = self
            .backend
            .upload(&key, content, content_type)
            .await
            .inspect_err(|e| {
                warn!(provider = %self.provider(), key = %key, error = %e, "upload failed");
            })?;

        info!(provider = %self.provider(), key = %key, size, content_type, "attachment uploaded");
        Ok(stored)
    }

    /// Open `attachments/{file_name}` for reading.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object is missing, or a provider error.
    pub async fn download_file(&self, file_name: &str) -> Result<ObjectDownload, StorageError> {
        let key = object_key(file_name)?;

        let download = self
            .backend
            .download(&key)
            .await
            .inspect_err(|e| {
                warn!(provider = %self.provider(), key = %key, error = %e, "download failed");
            })?;

        debug!(
            provider = %self.provider(),
            key = %key,
            length = ?download.content_length,
            "attachment opened"
        );
        Ok(download)
    }

    /// Remove `attachments/{file_name}`.
    ///
    /// Object stores succeed when the object is already gone; SFTP and FTP
    /// report `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a provider failure.
    pub async fn delete_file(&self, file_name: &str) -> Result<(), StorageError> {
        let key = object_key(file_name)?;

        self.backend
            .delete(&key)
            .await
            .inspect_err(|e| {
                warn!(provider = %self.provider(), key = %key, error = %e, "delete failed");
            })?;

        info!(provider = %self.provider(), key = %key, "attachment deleted");
        Ok(())
    }

    /// Move `old_file_name` to `new_file_name`. Renaming onto itself is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name, a missing source, or a provider
    /// failure. `RenameIncomplete` means both objects may now exist.
    pub async fn rename_file(
        &self,
        old_file_name: &str,
        new_file_name: &str,
    ) -> Result<(), StorageError> {
        let from = object_key(old_file_name)?;
        let to = object_key(new_file_name)?;

        if from == to {
            debug!(provider = %self.provider(), key = %from, "rename onto itself skipped");
            return Ok(());
        }

        self.backend
            .rename(&from, &to)
            .await
            .inspect_err(|e| {
                warn!(
                    provider = %self.provider(),
                    from = %from,
                    to = %to,
                    error = %e,
                    "rename failed"
                );
            })?;

        info!(provider = %self.provider(), from = %from, to = %to, "attachment renamed");
        Ok(())
    }

    /// Presigned GET URL for `attachments/{file_name}`.
    ///
    /// `expires_in` defaults to the configured public URL lifetime and must
    /// be between 1 second and 7 days. The object's existence is not checked.
    ///
    /// # Errors
    ///
    /// Returns `PublicUrlNotSupported` for SFTP and FTP, `InvalidExpiry` for
    /// an out-of-range lifetime, or a provider error.
    pub async fn generate_public_url(
        &self,
        file_name: &str,
        expires_in: Option<Duration>,
    ) -> Result<PresignedUrl, StorageError> {
        let provider = self.provider();
        if !provider.supports_public_urls() {
            return Err(StorageError::PublicUrlNotSupported { provider });
        }

        let key = object_key(file_name)?;
        let ttl =
            expires_in.unwrap_or_else(|| Duration::from_secs(self.limits.public_url_ttl_secs));
        if ttl.is_zero() || ttl > Duration::from_secs(MAX_PUBLIC_URL_TTL_SECS) {
            return Err(StorageError::InvalidExpiry {
                secs: ttl.as_secs(),
                max: MAX_PUBLIC_URL_TTL_SECS,
            });
        }

        let url = self
            .backend
            .presign(&key, ttl)
            .await
            .inspect_err(|e| {
                warn!(provider = %provider, key = %key, error = %e, "presign failed");
            })?;

        debug!(provider = %provider, key = %key, expires_at = %url.expires_at, "public url issued");
        Ok(url)
    }
}
