//! FTP backend over `suppaftp`, pooled control connections.

use std::io::Cursor;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Mode, Status};
use tracing::{debug, warn};

use super::backend::{ObjectDownload, StorageBackend, StoredObject};
use super::config::{FtpConfig, PoolConfig, ProviderKind};
use super::error::StorageError;
use super::key::{parent_dirs, remote_path};
use super::pool::{SessionManager, SessionPool};

/// Opens logged-in FTP control connections in binary mode.
pub struct FtpSessionManager {
    host: String,
    port: u16,
    username: String,
    password: String,
    passive: bool,
    timeout: Duration,
}

impl FtpSessionManager {
    /// Create a manager from the FTP section.
    #[must_use]
    pub fn new(config: &FtpConfig, timeout: Duration) -> Self {
        if !config.passive {
            warn!(host = %config.host, "ftp active mode requires the server to reach this host");
        }
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            passive: config.passive,
            timeout,
        }
    }

    fn resolve(&self) -> Result<SocketAddr, StorageError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| StorageError::connection(format!("resolve {}: {e}", self.host)))?
            .next()
            .ok_or_else(|| StorageError::connection(format!("no address for {}", self.host)))
    }
}

impl SessionManager for FtpSessionManager {
    type Session = FtpStream;

    fn connect(&self) -> Result<FtpStream, StorageError> {
        let addr = self.resolve()?;
        let mut stream = FtpStream::connect_timeout(addr, self.timeout)
            .map_err(|e| StorageError::connection(format!("ftp {addr}: {e}")))?;

        stream.set_mode(if self.passive {
            Mode::Passive
        } else {
            Mode::Active
        });
        stream
            .login(self.username.as_str(), self.password.as_str())
            .map_err(|e| StorageError::connection(format!("ftp login failed: {e}")))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| StorageError::connection(format!("ftp binary mode: {e}")))?;

        debug!(host = %self.host, port = self.port, passive = self.passive, "ftp session opened");
        Ok(stream)
    }

    fn is_alive(&self, session: &mut FtpStream) -> bool {
        session.noop().is_ok()
    }
}

/// Map a `suppaftp` error for `key`. 550 means the file is unavailable.
fn map_err(key: &str) -> impl FnOnce(FtpError) -> StorageError + '_ {
    move |err| match &err {
        FtpError::UnexpectedResponse(response)
            if matches!(response.status, Status::FileUnavailable) =>
        {
            StorageError::not_found(key)
        }
        FtpError::ConnectionError(_) => StorageError::connection(format!("{key}: {err}")),
        _ => StorageError::operation(format!("{key}: {err}")),
    }
}

fn ensure_parent_dirs(stream: &mut FtpStream, path: &str) {
    for dir in parent_dirs(path) {
        // MKD on an existing directory fails with 550; that is fine here.
        let _ = stream.mkdir(dir.as_str());
    }
}

/// FTP storage under `{base_path}/attachments/`.
pub struct FtpBackend {
    pool: SessionPool<FtpSessionManager>,
    base_path: String,
}

impl FtpBackend {
    /// Build the backend. No connection is made until the first operation.
    #[must_use]
    pub fn new(config: &FtpConfig, pool: &PoolConfig) -> Self {
        Self {
            pool: SessionPool::new(
                FtpSessionManager::new(config, pool.connect_timeout()),
                pool.max_sessions,
            ),
            base_path: config.base_path.clone(),
        }
    }

    fn path(&self, key: &str) -> String {
        remote_path(&self.base_path, key)
    }
}

#[async_trait]
impl StorageBackend for FtpBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Ftp
    }

    async fn upload(
        &self,
        key: &str,
        content: Bytes,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let path = self.path(key);
        let label = key.to_string();

        self.pool
            .run(move |stream| {
                ensure_parent_dirs(stream, &path);
                stream
                    .put_file(path.as_str(), &mut Cursor::new(content.as_ref()))
                    .map_err(map_err(&label))?;
                Ok(())
            })
            .await?;

        Ok(StoredObject {
            path: key.to_string(),
            url: None,
        })
    }

    async fn download(&self, key: &str) -> Result<ObjectDownload, StorageError> {
        let path = self.path(key);
        let label = key.to_string();

        let bytes = self
            .pool
            .run(move |stream| {
                let buffer = stream
                    .retr_as_buffer(path.as_str())
                    .map_err(map_err(&label))?;
                Ok(Bytes::from(buffer.into_inner()))
            })
            .await?;

        Ok(ObjectDownload::from_bytes(bytes))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        let label = key.to_string();

        self.pool
            .run(move |stream| stream.rm(path.as_str()).map_err(map_err(&label)))
            .await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let from_path = self.path(from);
        let to_path = self.path(to);
        let label = from.to_string();

        self.pool
            .run(move |stream| {
                ensure_parent_dirs(stream, &to_path);
                stream
                    .rename(from_path.as_str(), to_path.as_str())
                    .map_err(map_err(&label))
            })
            .await
    }
}
