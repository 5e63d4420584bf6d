use std::path::Path;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Put `source` at `dest`: hard link when possible, full copy otherwise
/// (e.g. cache and instance on different filesystems).
///
/// Any existing file at `dest` is removed first. There is no atomic-replace
/// guarantee for a concurrent reader of `dest`.
pub async fn place(source: &Path, dest: &Path) -> LauncherResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }

    match tokio::fs::remove_file(dest).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(LauncherError::io(dest, e)),
    }

    match tokio::fs::hard_link(source, dest).await {
        Ok(()) => Ok(()),
        Err(link_err) => {
            debug!(
                "Hard link {:?} -> {:?} failed ({}), copying",
                source, dest, link_err
            );
            tokio::fs::copy(source, dest)
                .await
                .map(|_| ())
                .map_err(|e| LauncherError::io(dest, e))
        }
    }
}
