//! Attachment storage over MinIO, S3, SFTP and FTP.
//!
//! Callers work with bare file names through [`AttachmentStorageService`];
//! every object is namespaced under `attachments/`. The provider is chosen
//! once from configuration and sits behind the [`StorageBackend`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 AttachmentStorageService                      │
//! │   upload_file · download_file · delete_file · rename_file     │
//! │   generate_public_url                                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │                 dyn StorageBackend                            │
//! ├─────────────────────────────┬────────────────────────────────┤
//! │ ObjectStoreBackend (OpenDAL)│ SftpBackend (ssh2)             │
//! │   MinIO · S3                │ FtpBackend (suppaftp)          │
//! │                             │   └─ SessionPool               │
//! └─────────────────────────────┴────────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
mod ftp;
mod key;
mod object;
mod pool;
mod service;
mod sftp;

pub use backend::{
    ByteStream, ObjectDownload, PresignedUrl, StorageBackend, StoredObject, create_backend,
};
pub use config::{
    AttachmentStorageConfig, FtpConfig, MinioConfig, PoolConfig, ProviderConfigs, ProviderKind,
    S3Config, SftpConfig, StorageLimits,
};
pub use error::StorageError;
pub use ftp::{FtpBackend, FtpSessionManager};
pub use key::{ATTACHMENTS_PREFIX, object_key, validate_file_name};
pub use object::ObjectStoreBackend;
pub use pool::{SessionManager, SessionPool};
pub use service::{AttachmentStorageService, DEFAULT_CONTENT_TYPE, MAX_PUBLIC_URL_TTL_SECS};
pub use sftp::{SftpBackend, SftpSessionManager};
