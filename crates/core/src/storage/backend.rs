//! Backend capability interface and the factory that picks one.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use super::config::{AttachmentStorageConfig, ProviderKind};
use super::error::StorageError;
use super::ftp::FtpBackend;
use super::object::ObjectStoreBackend;
use super::sftp::SftpBackend;

/// Byte stream handed to callers of `download`. The caller owns it.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Where an upload landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Provider-relative key, always under `attachments/`.
    pub path: String,
    /// Direct object URL, only for providers that have one (MinIO, S3).
    pub url: Option<String>,
}

/// A downloaded object.
pub struct ObjectDownload {
    /// Object bytes from offset 0.
    pub stream: ByteStream,
    /// Size in bytes, when known up front.
    pub content_length: Option<u64>,
    /// Stored content type, when the provider keeps one.
    pub content_type: Option<String>,
}

impl ObjectDownload {
    /// Wrap an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: Bytes) -> Self {
        let len = bytes.len() as u64;
        Self {
            stream: stream::iter(std::iter::once(Ok(bytes))).boxed(),
            content_length: Some(len),
            content_type: None,
        }
    }

    /// Drain the stream into one buffer.
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        let buf = self
            .stream
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(buf.freeze())
    }
}

impl fmt::Debug for ObjectDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDownload")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Presigned URL for download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (GET).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Headers the request must carry.
    pub headers: HashMap<String, String>,
}

/// One storage provider.
///
/// Keys passed in are already namespaced (`attachments/...`); backends with
/// a base path prepend it themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which provider this is.
    fn provider(&self) -> ProviderKind;

    /// Create or overwrite `key` with `content`.
    async fn upload(
        &self,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Open `key` for reading.
    async fn download(&self, key: &str) -> Result<ObjectDownload, StorageError>;

    /// Remove `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Move `from` to `to`.
    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Presigned GET URL valid for `expires_in`.
    async fn presign(&self, key: &str, expires_in: Duration) -> Result<PresignedUrl, StorageError> {
        let _ = (key, expires_in);
        Err(StorageError::PublicUrlNotSupported {
            provider: self.provider(),
        })
    }
}

/// Build the backend named by `config.provider`.
///
/// Nothing connects here; S3/MinIO clients are stateless and SFTP/FTP
/// sessions open on first use.
pub fn create_backend(
    config: &AttachmentStorageConfig,
) -> Result<Box<dyn StorageBackend>, StorageError> {
    config.validate()?;

    let backend: Box<dyn StorageBackend> = match config.provider {
        ProviderKind::S3 => Box::new(ObjectStoreBackend::s3(config.s3_section()?)?),
        ProviderKind::Minio => Box::new(ObjectStoreBackend::minio(config.minio_section()?)?),
        ProviderKind::Sftp => Box::new(SftpBackend::new(config.sftp_section()?, &config.pool)?),
        ProviderKind::Ftp => Box::new(FtpBackend::new(config.ftp_section()?, &config.pool)),
    };

    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::{FtpConfig, MinioConfig, S3Config, SftpConfig};

    fn s3() -> S3Config {
        S3Config {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_factory_selects_each_provider() {
        let configs = [
            AttachmentStorageConfig::s3(s3()),
            AttachmentStorageConfig::minio(MinioConfig {
                endpoint: "localhost".to_string(),
                port: Some(9000),
                use_ssl: false,
                access_key: "minio".to_string(),
                secret_key: "minio123".to_string(),
                bucket: "uploads".to_string(),
                region: "us-east-1".to_string(),
            }),
            AttachmentStorageConfig::sftp(SftpConfig {
                host: "localhost".to_string(),
                port: 22,
                username: "deploy".to_string(),
                password: Some("pw".to_string()),
                private_key: None,
                passphrase: None,
                base_path: "/srv".to_string(),
            }),
            AttachmentStorageConfig::ftp(FtpConfig {
                host: "localhost".to_string(),
                port: 21,
                username: "anon".to_string(),
                password: String::new(),
                base_path: String::new(),
                passive: true,
            }),
        ];

        for config in configs {
            let backend = create_backend(&config).expect("backend should build");
            assert_eq!(backend.provider(), config.provider);
        }
    }

    #[test]
    fn test_factory_rejects_missing_section() {
        let config = AttachmentStorageConfig::new(ProviderKind::S3, Default::default());
        let err = create_backend(&config).err().expect("should fail");
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_download_from_bytes_roundtrip() {
        let download = ObjectDownload::from_bytes(Bytes::from_static(b"hello"));
        assert_eq!(download.content_length, Some(5));
        let bytes = download.into_bytes().await.expect("stream");
        assert_eq!(&bytes[..], b"hello");
    }
}
