//! Storage configuration types.
//!
//! Mirrors the persisted "storage connection" record: a provider
//! discriminator plus one sub-section per provider. Only the section that
//! matches `provider` is read; the others may be present and are ignored.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderKind {
    /// MinIO (S3-compatible, self-hosted).
    Minio,
    /// Amazon S3.
    S3,
    /// SFTP over SSH.
    Sftp,
    /// Plain FTP.
    Ftp,
}

impl ProviderKind {
    /// Name used in configuration and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minio => "minio",
            Self::S3 => "s3",
            Self::Sftp => "sftp",
            Self::Ftp => "ftp",
        }
    }

    /// Whether the provider can mint presigned public URLs.
    #[must_use]
    pub const fn supports_public_urls(self) -> bool {
        matches!(self, Self::Minio | Self::S3)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minio" => Ok(Self::Minio),
            "s3" => Ok(Self::S3),
            "sftp" => Ok(Self::Sftp),
            "ftp" => Ok(Self::Ftp),
            _ => Err(StorageError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_sftp_port() -> u16 {
    22
}

fn default_ftp_port() -> u16 {
    21
}

fn default_true() -> bool {
    true
}

/// MinIO connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfig {
    /// Host name, or a full URL such as `http://minio:9000`.
    pub endpoint: String,
    /// Port, when `endpoint` is a bare host.
    #[serde(default)]
    pub port: Option<u16>,
    /// Use HTTPS when `endpoint` is a bare host.
    #[serde(default)]
    pub use_ssl: bool,
    /// Access key.
    pub access_key: String,
    /// Secret key.
    pub secret_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Region.
    #[serde(default = "default_region")]
    pub region: String,
}

impl MinioConfig {
    /// Endpoint URL the S3 client talks to.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            return endpoint.to_string();
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{endpoint}:{port}"),
            None => format!("{scheme}://{endpoint}"),
        }
    }

    /// Base URL that object keys are appended to (path-style addressing).
    #[must_use]
    pub fn object_base_url(&self) -> String {
        format!("{}/{}", self.endpoint_url(), self.bucket)
    }
}

/// Amazon S3 connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// AWS access key ID.
    pub access_key_id: String,
    /// AWS secret access key.
    pub secret_access_key: String,
    /// Bucket name.
    pub bucket: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible hosts.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl S3Config {
    /// Endpoint URL the S3 client talks to.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim().trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", self.region),
        }
    }

    /// Base URL that object keys are appended to.
    ///
    /// AWS itself uses virtual-hosted style; custom endpoints use path style.
    #[must_use]
    pub fn object_base_url(&self) -> String {
        match &self.endpoint {
            Some(_) => format!("{}/{}", self.endpoint_url(), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

/// SFTP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Password for password authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Path to a private key file for public-key authentication.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Passphrase for `private_key`.
    #[serde(default)]
    pub passphrase: Option<String>,
    /// Directory that `attachments/` is created under.
    #[serde(default)]
    pub base_path: String,
}

/// FTP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Directory that `attachments/` is created under.
    #[serde(default)]
    pub base_path: String,
    /// Use passive mode for data connections.
    #[serde(default = "default_true")]
    pub passive: bool,
}

/// Per-provider sections. Only the one matching the provider is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfigs {
    /// MinIO section.
    #[serde(default)]
    pub minio: Option<MinioConfig>,
    /// S3 section.
    #[serde(default)]
    pub s3: Option<S3Config>,
    /// SFTP section.
    #[serde(default)]
    pub sftp: Option<SftpConfig>,
    /// FTP section.
    #[serde(default)]
    pub ftp: Option<FtpConfig>,
}

/// Upload and URL limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLimits {
    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types. Empty means any type is accepted.
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
    /// Default lifetime of presigned public URLs, in seconds.
    #[serde(default = "default_public_url_ttl")]
    pub public_url_ttl_secs: u64,
}

impl StorageLimits {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default public URL TTL: 1 hour.
    pub const DEFAULT_PUBLIC_URL_TTL: u64 = 3600;

    /// Check if a MIME type is allowed. Parameters (`; charset=...`) are ignored.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        if self.allowed_mime_types.is_empty() {
            return true;
        }
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}

impl Default for StorageLimits {
    fn default() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Vec::new(),
            public_url_ttl_secs: Self::DEFAULT_PUBLIC_URL_TTL,
        }
    }
}

fn default_max_file_size() -> u64 {
    StorageLimits::DEFAULT_MAX_FILE_SIZE
}

fn default_public_url_ttl() -> u64 {
    StorageLimits::DEFAULT_PUBLIC_URL_TTL
}

/// Session pool sizing for SFTP and FTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of concurrently open sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// TCP connect and protocol I/O timeout, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PoolConfig {
    /// Default session cap.
    pub const DEFAULT_MAX_SESSIONS: usize = 4;
    /// Default timeout: 30 seconds.
    pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;

    /// Connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            connect_timeout_secs: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

fn default_max_sessions() -> usize {
    PoolConfig::DEFAULT_MAX_SESSIONS
}

fn default_connect_timeout() -> u64 {
    PoolConfig::DEFAULT_CONNECT_TIMEOUT
}

/// Attachment storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentStorageConfig {
    /// Which backend to use.
    pub provider: ProviderKind,
    /// Provider sections.
    #[serde(default)]
    pub config: ProviderConfigs,
    /// Upload and URL limits.
    #[serde(default)]
    pub limits: StorageLimits,
    /// SFTP/FTP session pool settings.
    #[serde(default)]
    pub pool: PoolConfig,
}

impl AttachmentStorageConfig {
    /// Create a config for the given provider with default limits.
    #[must_use]
    pub fn new(provider: ProviderKind, config: ProviderConfigs) -> Self {
        Self {
            provider,
            config,
            limits: StorageLimits::default(),
            pool: PoolConfig::default(),
        }
    }

    /// MinIO config.
    #[must_use]
    pub fn minio(minio: MinioConfig) -> Self {
        Self::new(
            ProviderKind::Minio,
            ProviderConfigs {
                minio: Some(minio),
                ..ProviderConfigs::default()
            },
        )
    }

    /// S3 config.
    #[must_use]
    pub fn s3(s3: S3Config) -> Self {
        Self::new(
            ProviderKind::S3,
            ProviderConfigs {
                s3: Some(s3),
                ..ProviderConfigs::default()
            },
        )
    }

    /// SFTP config.
    #[must_use]
    pub fn sftp(sftp: SftpConfig) -> Self {
        Self::new(
            ProviderKind::Sftp,
            ProviderConfigs {
                sftp: Some(sftp),
                ..ProviderConfigs::default()
            },
        )
    }

    /// FTP config.
    #[must_use]
    pub fn ftp(ftp: FtpConfig) -> Self {
        Self::new(
            ProviderKind::Ftp,
            ProviderConfigs {
                ftp: Some(ftp),
                ..ProviderConfigs::default()
            },
        )
    }

    /// Load the `storage` section from the layered application config.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the section is missing or malformed.
    pub fn load() -> Result<Self, StorageError> {
        unidata_shared::load_section("storage")
            .map_err(|e| StorageError::configuration(e.to_string()))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.limits.max_file_size = size;
        self
    }

    /// Set allowed MIME types.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.limits.allowed_mime_types = types;
        self
    }

    /// Set default public URL TTL.
    #[must_use]
    pub fn with_public_url_ttl(mut self, secs: u64) -> Self {
        self.limits.public_url_ttl_secs = secs;
        self
    }

    /// Set the session pool cap.
    #[must_use]
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.pool.max_sessions = max;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.pool.connect_timeout_secs = secs;
        self
    }

    /// The MinIO section, required when `provider` is MinIO.
    pub fn minio_section(&self) -> Result<&MinioConfig, StorageError> {
        self.section(self.config.minio.as_ref())
    }

    /// The S3 section, required when `provider` is S3.
    pub fn s3_section(&self) -> Result<&S3Config, StorageError> {
        self.section(self.config.s3.as_ref())
    }

    /// The SFTP section, required when `provider` is SFTP.
    pub fn sftp_section(&self) -> Result<&SftpConfig, StorageError> {
        self.section(self.config.sftp.as_ref())
    }

    /// The FTP section, required when `provider` is FTP.
    pub fn ftp_section(&self) -> Result<&FtpConfig, StorageError> {
        self.section(self.config.ftp.as_ref())
    }

    fn section<'a, T>(&self, section: Option<&'a T>) -> Result<&'a T, StorageError> {
        section.ok_or_else(|| {
            StorageError::configuration(format!(
                "missing {0} configuration for provider {0}",
                self.provider
            ))
        })
    }

    /// Check that the section matching `provider` is present and usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first problem found.
    pub fn validate(&self) -> Result<(), StorageError> {
        match self.provider {
            ProviderKind::Minio => {
                let minio = self.minio_section()?;
                require("minio.endpoint", &minio.endpoint)?;
                require("minio.bucket", &minio.bucket)?;
            }
            ProviderKind::S3 => {
                let s3 = self.s3_section()?;
                require("s3.bucket", &s3.bucket)?;
                require("s3.region", &s3.region)?;
            }
            ProviderKind::Sftp => {
                let sftp = self.sftp_section()?;
                require("sftp.host", &sftp.host)?;
                require("sftp.username", &sftp.username)?;
                if sftp.password.is_none() && sftp.private_key.is_none() {
                    return Err(StorageError::configuration(
                        "sftp requires a password or a private_key",
                    ));
                }
            }
            ProviderKind::Ftp => {
                let ftp = self.ftp_section()?;
                require("ftp.host", &ftp.host)?;
                require("ftp.username", &ftp.username)?;
            }
        }
        if self.pool.max_sessions == 0 {
            return Err(StorageError::configuration(
                "pool.max_sessions must be at least 1",
            ));
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::configuration(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn s3_json() -> serde_json::Value {
        serde_json::json!({
            "provider": "s3",
            "config": {
                "s3": {
                    "access_key_id": "AKIAEXAMPLE",
                    "secret_access_key": "secret",
                    "bucket": "test-bucket",
                    "region": "us-east-1"
                }
            }
        })
    }

    #[rstest]
    #[case("minio", ProviderKind::Minio)]
    #[case("s3", ProviderKind::S3)]
    #[case("SFTP", ProviderKind::Sftp)]
    #[case(" ftp ", ProviderKind::Ftp)]
    fn test_provider_parse(#[case] input: &str, #[case] expected: ProviderKind) {
        assert_eq!(input.parse::<ProviderKind>().expect("known provider"), expected);
    }

    #[test]
    fn test_provider_unknown() {
        let err = "gcs".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported provider: gcs");
    }

    #[test]
    fn test_deserialize_s3_record() {
        let config: AttachmentStorageConfig =
            serde_json::from_value(s3_json()).expect("valid config");
        assert_eq!(config.provider, ProviderKind::S3);
        assert!(config.validate().is_ok());
        let s3 = config.s3_section().expect("s3 section");
        assert_eq!(s3.bucket, "test-bucket");
        assert_eq!(s3.endpoint_url(), "https://s3.us-east-1.amazonaws.com");
        assert_eq!(
            s3.object_base_url(),
            "https://test-bucket.s3.us-east-1.amazonaws.com"
        );
        assert_eq!(config.limits.public_url_ttl_secs, 3600);
        assert_eq!(config.pool.max_sessions, PoolConfig::DEFAULT_MAX_SESSIONS);
    }

    #[test]
    fn test_deserialize_unknown_provider() {
        let mut value = s3_json();
        value["provider"] = serde_json::json!("dropbox");
        let err = serde_json::from_value::<AttachmentStorageConfig>(value).unwrap_err();
        assert!(err.to_string().contains("Unsupported provider: dropbox"));
    }

    #[test]
    fn test_other_sections_ignored() {
        let mut value = s3_json();
        value["config"]["ftp"] = serde_json::json!({ "host": "", "username": "" });
        let config: AttachmentStorageConfig = serde_json::from_value(value).expect("valid");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_matching_section() {
        let config = AttachmentStorageConfig::new(ProviderKind::Minio, ProviderConfigs::default());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
        assert!(err.to_string().contains("missing minio configuration"));
    }

    #[test]
    fn test_sftp_requires_credentials() {
        let config = AttachmentStorageConfig::sftp(SftpConfig {
            host: "sftp.local".to_string(),
            port: 22,
            username: "deploy".to_string(),
            password: None,
            private_key: None,
            passphrase: None,
            base_path: "/srv".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let config: AttachmentStorageConfig =
            serde_json::from_value(s3_json()).expect("valid config");
        assert!(config.with_max_sessions(0).validate().is_err());
    }

    #[test]
    fn test_ftp_defaults() {
        let ftp: FtpConfig = serde_json::from_value(serde_json::json!({
            "host": "ftp.local",
            "username": "anon"
        }))
        .expect("valid");
        assert_eq!(ftp.port, 21);
        assert!(ftp.passive);
        assert!(ftp.base_path.is_empty());
    }

    #[rstest]
    #[case("minio.local", Some(9000), false, "http://minio.local:9000")]
    #[case("minio.local", None, true, "https://minio.local")]
    #[case("http://minio:9000/", Some(1), true, "http://minio:9000")]
    fn test_minio_endpoint_url(
        #[case] endpoint: &str,
        #[case] port: Option<u16>,
        #[case] use_ssl: bool,
        #[case] expected: &str,
    ) {
        let minio = MinioConfig {
            endpoint: endpoint.to_string(),
            port,
            use_ssl,
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            bucket: "uploads".to_string(),
            region: default_region(),
        };
        assert_eq!(minio.endpoint_url(), expected);
        assert_eq!(minio.object_base_url(), format!("{expected}/uploads"));
    }

    #[test]
    fn test_mime_type_allow_list() {
        let mut limits = StorageLimits::default();
        assert!(limits.is_mime_type_allowed("application/x-anything"));

        limits.allowed_mime_types = vec!["application/pdf".to_string()];
        assert!(limits.is_mime_type_allowed("application/pdf"));
        assert!(limits.is_mime_type_allowed("Application/PDF; charset=binary"));
        assert!(!limits.is_mime_type_allowed("image/png"));
    }
}
