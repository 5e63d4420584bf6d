// ─── Content Cache ───
// Grow-only store shared by every instance. Assets are keyed by hash with a
// two-level fan-out, libraries by their maven path. Nothing is ever evicted;
// a file is only replaced after its hash was found to be wrong.

pub mod integrity;
pub mod placement;

use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

pub use integrity::{
    check_file, discard, is_sha1_hex, is_valid, sha1_file, sha1_hex, verify_or_discard, FileCheck,
};
pub use placement::place;

/// `<hash[0:2]>/<hash>`
pub fn object_relative_path(hash: &str) -> String {
    let prefix = hash.get(..2).unwrap_or(hash);
    format!("{}/{}", prefix, hash)
}

#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("assets").join("objects")
    }

    pub fn indexes_dir(&self) -> PathBuf {
        self.root.join("assets").join("indexes")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Location of an asset object keyed by its hash.
    pub fn resolve_path(&self, hash: &str) -> PathBuf {
        self.objects_dir().join(object_relative_path(hash))
    }

    pub fn index_path(&self, index_id: &str) -> PathBuf {
        self.indexes_dir().join(format!("{}.json", index_id))
    }

    pub fn library_path(&self, relative: &str) -> PathBuf {
        self.libraries_dir().join(relative)
    }

    pub async fn ensure_layout(&self) -> LauncherResult<()> {
        for dir in [self.objects_dir(), self.indexes_dir(), self.libraries_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| LauncherError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Write an asset object. The caller must still verify it before trusting it.
    pub async fn store(&self, hash: &str, bytes: &[u8]) -> LauncherResult<PathBuf> {
        let path = self.resolve_path(hash);
        write_file(&path, bytes).await?;
        Ok(path)
    }

    /// Write a library under its maven path. Same contract as [`Self::store`].
    pub async fn store_library(&self, relative: &str, bytes: &[u8]) -> LauncherResult<PathBuf> {
        let path = self.library_path(relative);
        write_file(&path, bytes).await?;
        Ok(path)
    }
}

/// Create parent directories and write `bytes` to `path`.
pub(crate) async fn write_file(path: &Path, bytes: &[u8]) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| LauncherError::io(path, e))
}
