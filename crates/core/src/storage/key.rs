//! Object naming.
//!
//! Callers hand over a bare file name; every object is stored under
//! `attachments/` relative to the bucket root or the configured base path.

use super::error::StorageError;

/// Namespace segment every attachment lives under.
pub const ATTACHMENTS_PREFIX: &str = "attachments";

/// Validate a caller-supplied file name.
///
/// Nested names (`2024/report.pdf`) are allowed; empty segments, `.`/`..`,
/// leading slashes, backslashes and control characters are not.
pub fn validate_file_name(file_name: &str) -> Result<(), StorageError> {
    if file_name.trim().is_empty() {
        return Err(StorageError::invalid_file_name("file name must not be empty"));
    }
    if file_name.starts_with('/') {
        return Err(StorageError::invalid_file_name(format!(
            "{file_name}: must be relative"
        )));
    }
    if file_name.chars().any(|c| c == '\\' || c.is_control()) {
        return Err(StorageError::invalid_file_name(format!(
            "{file_name}: contains a backslash or control character"
        )));
    }
    if file_name
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::invalid_file_name(format!(
            "{file_name}: contains an empty or relative segment"
        )));
    }
    Ok(())
}

/// Provider-relative key for a file name: `attachments/{file_name}`.
pub fn object_key(file_name: &str) -> Result<String, StorageError> {
    validate_file_name(file_name)?;
    Ok(format!("{ATTACHMENTS_PREFIX}/{file_name}"))
}

/// Join a remote base path and an object key with `/`.
///
/// An empty base path leaves the key relative to the login directory.
#[must_use]
pub fn remote_path(base_path: &str, key: &str) -> String {
    let base = base_path.trim().trim_end_matches('/');
    if base.is_empty() {
        if base_path.trim().starts_with('/') {
            return format!("/{key}");
        }
        return key.to_string();
    }
    format!("{base}/{key}")
}

/// Every ancestor directory of `path`, shallowest first.
///
/// `/srv/files/attachments/a.txt` yields `/srv`, `/srv/files`,
/// `/srv/files/attachments`.
#[must_use]
pub fn parent_dirs(path: &str) -> Vec<String> {
    let absolute = path.starts_with('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut dirs = Vec::new();
    let mut current = String::new();
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        if !current.is_empty() || absolute {
            current.push('/');
        }
        current.push_str(segment);
        dirs.push(current.clone());
    }
    dirs
}
