use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure classes of the installation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout, bad status, or every mirror exhausted.
    Transport,
    /// Hash mismatch. The offending file is already deleted.
    Integrity,
    /// Manifest, version JSON or asset index malformed / missing fields.
    Descriptor,
    /// Archive extraction failed.
    Extraction,
    /// Directory creation, write, link, copy or permission failure.
    Filesystem,
    /// A worker task was aborted before reporting.
    Internal,
}

/// Central error type for the installation backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("All mirrors failed for {target}")]
    AllMirrorsFailed { target: String },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Descriptor ──────────────────────────────────────
    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Extraction failed for {archive:?}: {message}")]
    Extraction { archive: PathBuf, message: String },

    // ── Pipeline ────────────────────────────────────────
    #[error("Assets install failed: {0}")]
    AssetStage(Box<LauncherError>),

    #[error("Worker aborted: {0}")]
    Worker(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LauncherError::Io { .. } => ErrorKind::Filesystem,
            LauncherError::Http(_)
            | LauncherError::DownloadFailed { .. }
            | LauncherError::AllMirrorsFailed { .. } => ErrorKind::Transport,
            LauncherError::Sha1Mismatch { .. } => ErrorKind::Integrity,
            LauncherError::Descriptor(_)
            | LauncherError::InvalidMavenCoordinate(_)
            | LauncherError::Json(_) => ErrorKind::Descriptor,
            LauncherError::Extraction { .. } => ErrorKind::Extraction,
            LauncherError::AssetStage(inner) => inner.kind(),
            LauncherError::Worker(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_stage_inherits_inner_kind() {
        let inner = LauncherError::Sha1Mismatch {
            path: PathBuf::from("a/b"),
            expected: "00".into(),
            actual: "11".into(),
        };
        let err = LauncherError::AssetStage(Box::new(inner));
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(err.to_string().starts_with("Assets install failed: SHA-1 mismatch"));
    }

    #[test]
    fn transport_variants_share_kind() {
        let a = LauncherError::AllMirrorsFailed {
            target: "x".into(),
        };
        let b = LauncherError::DownloadFailed {
            url: "http://x".into(),
            status: 404,
        };
        assert_eq!(a.kind(), ErrorKind::Transport);
        assert_eq!(b.kind(), ErrorKind::Transport);
    }
}
