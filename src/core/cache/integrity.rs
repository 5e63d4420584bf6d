use std::fs::File;
use std::path::Path;

use sha1::{Digest, Sha1};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// Lowercase hex SHA-1 of an in-memory buffer.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-1 of a file on disk, streamed through the hasher on the blocking pool.
pub async fn sha1_file(path: &Path) -> LauncherResult<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut file = File::open(&path).map_err(|e| LauncherError::io(&path, e))?;
        let mut hasher = Sha1::new();
        std::io::copy(&mut file, &mut hasher).map_err(|e| LauncherError::io(&path, e))?;
        Ok::<_, LauncherError>(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(|e| LauncherError::Worker(e.to_string()))?
}

/// Exactly 40 hex characters.
pub fn is_sha1_hex(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// What a local copy looks like relative to its declared hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCheck {
    Missing,
    Valid,
    /// Present but unreadable or with the wrong SHA-1.
    Corrupt,
}

pub async fn check_file(path: &Path, expected: Option<&str>) -> FileCheck {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return FileCheck::Missing,
    }
    match expected {
        None => FileCheck::Valid,
        Some(expected) => match sha1_file(path).await {
            Ok(actual) if actual.eq_ignore_ascii_case(expected) => FileCheck::Valid,
            _ => FileCheck::Corrupt,
        },
    }
}

/// A file is valid when it exists and, if a hash is declared, its SHA-1 matches.
/// An unreadable file is simply invalid.
pub async fn is_valid(path: &Path, expected: Option<&str>) -> bool {
    check_file(path, expected).await == FileCheck::Valid
}

/// Delete a file known to be bad. Already gone is fine.
pub async fn discard(path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LauncherError::io(path, e)),
    }
}

/// Re-hash a freshly written file; on mismatch delete it and return
/// [`LauncherError::Sha1Mismatch`]. No hash declared means nothing to check.
pub async fn verify_or_discard(path: &Path, expected: Option<&str>) -> LauncherResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = sha1_file(path).await?;
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }

    warn!("Checksum mismatch for {:?}, discarding", path);
    discard(path).await?;
    Err(LauncherError::Sha1Mismatch {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        actual,
    })
}
