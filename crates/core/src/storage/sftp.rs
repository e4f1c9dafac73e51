//! SFTP backend over `ssh2`, one pooled SSH session per in-flight operation.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ssh2::{ErrorCode, Session, Sftp};
use tracing::debug;

use super::backend::{ObjectDownload, StorageBackend, StoredObject};
use super::config::{PoolConfig, ProviderKind, SftpConfig};
use super::error::StorageError;
use super::key::{parent_dirs, remote_path};
use super::pool::{SessionManager, SessionPool};

/// `SSH_FX_NO_SUCH_FILE`.
const FX_NO_SUCH_FILE: i32 = 2;
/// `SSH_FX_NO_SUCH_PATH`.
const FX_NO_SUCH_PATH: i32 = 10;

enum SftpAuth {
    Password(String),
    KeyFile {
        path: String,
        passphrase: Option<String>,
    },
}

/// Opens authenticated SSH sessions.
pub struct SftpSessionManager {
    host: String,
    port: u16,
    username: String,
    auth: SftpAuth,
    timeout: Duration,
}

impl SftpSessionManager {
    /// Key auth wins when both a key and a password are configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when neither is set.
    pub fn new(config: &SftpConfig, timeout: Duration) -> Result<Self, StorageError> {
        let auth = match (&config.private_key, &config.password) {
            (Some(path), _) => SftpAuth::KeyFile {
                path: path.clone(),
                passphrase: config.passphrase.clone(),
            },
            (None, Some(password)) => SftpAuth::Password(password.clone()),
            (None, None) => {
                return Err(StorageError::configuration(
                    "sftp requires a password or a private_key",
                ));
            }
        };

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            auth,
            timeout,
        })
    }

    fn resolve(&self) -> Result<SocketAddr, StorageError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| StorageError::connection(format!("resolve {}: {e}", self.host)))?
            .next()
            .ok_or_else(|| StorageError::connection(format!("no address for {}", self.host)))
    }
}

impl SessionManager for SftpSessionManager {
    type Session = Session;

    fn connect(&self) -> Result<Session, StorageError> {
        let addr = self.resolve()?;
        let tcp = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| StorageError::connection(format!("sftp {addr}: {e}")))?;

        let mut session =
            Session::new().map_err(|e| StorageError::connection(format!("sftp session: {e}")))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| StorageError::connection(format!("sftp handshake with {addr}: {e}")))?;

        match &self.auth {
            SftpAuth::Password(password) => session.userauth_password(&self.username, password),
            SftpAuth::KeyFile { path, passphrase } => session.userauth_pubkey_file(
                &self.username,
                None,
                Path::new(path),
                passphrase.as_deref(),
            ),
        }
        .map_err(|e| StorageError::connection(format!("sftp authentication failed: {e}")))?;

        if !session.authenticated() {
            return Err(StorageError::connection("sftp authentication failed"));
        }

        debug!(host = %self.host, port = self.port, "sftp session opened");
        Ok(session)
    }

    fn is_alive(&self, session: &mut Session) -> bool {
        // keepalive_send is a no-op without an interval; ask the server instead.
        session.authenticated()
            && session
                .sftp()
                .and_then(|sftp| sftp.realpath(Path::new(".")))
                .is_ok()
    }
}

/// Map an `ssh2` error for `key`.
fn map_err(key: &str) -> impl FnOnce(ssh2::Error) -> StorageError + '_ {
    move |err| match err.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE | FX_NO_SUCH_PATH) => StorageError::not_found(key),
        _ => StorageError::operation(format!("{key}: {err}")),
    }
}

fn ensure_parent_dirs(sftp: &Sftp, path: &str) {
    for dir in parent_dirs(path) {
        let dir = Path::new(&dir);
        if sftp.stat(dir).is_err() {
            // Fails harmlessly if a concurrent upload created it first.
            let _ = sftp.mkdir(dir, 0o755);
        }
    }
}

/// SFTP storage under `{base_path}/attachments/`.
pub struct SftpBackend {
    pool: SessionPool<SftpSessionManager>,
    base_path: String,
}

impl SftpBackend {
    /// Build the backend. No connection is made until the first operation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no credentials are configured.
    pub fn new(config: &SftpConfig, pool: &PoolConfig) -> Result<Self, StorageError> {
        let manager = SftpSessionManager::new(config, pool.connect_timeout())?;
        Ok(Self {
            pool: SessionPool::new(manager, pool.max_sessions),
            base_path: config.base_path.clone(),
        })
    }

    fn path(&self, key: &str) -> String {
        remote_path(&self.base_path, key)
    }
}

#[async_trait]
impl StorageBackend for SftpBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Sftp
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
            .run(move |session| {
                let sftp = session.sftp().map_err(map_err(&label))?;
                ensure_parent_dirs(&sftp, &path);
                let mut file = sftp.create(Path::new(&path)).map_err(map_err(&label))?;
                file.write_all(&content)?;
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

        // Read fully while the session is checked out so it is back in the
        // pool before the caller starts consuming the stream.
        let bytes = self
            .pool
            .run(move |session| {
                let sftp = session.sftp().map_err(map_err(&label))?;
                let mut file = sftp.open(Path::new(&path)).map_err(map_err(&label))?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            })
            .await?;

        Ok(ObjectDownload::from_bytes(bytes))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        let label = key.to_string();

        self.pool
            .run(move |session| {
                let sftp = session.sftp().map_err(map_err(&label))?;
                sftp.unlink(Path::new(&path)).map_err(map_err(&label))
            })
            .await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let from_path = self.path(from);
        let to_path = self.path(to);
        let label = from.to_string();

        self.pool
            .run(move |session| {
                let sftp = session.sftp().map_err(map_err(&label))?;
                ensure_parent_dirs(&sftp, &to_path);
                sftp.rename(Path::new(&from_path), Path::new(&to_path), None)
                    .map_err(map_err(&label))
            })
            .await
    }
}
