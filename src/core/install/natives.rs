use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::archive::extract_zip;
use crate::core::error::{LauncherError, LauncherResult};

/// Unpack a native library archive into `natives_dir`, overwriting what is
/// already there. Returns the number of files written.
pub async fn extract_natives(archive: &Path, natives_dir: &Path) -> LauncherResult<usize> {
    let archive: PathBuf = archive.to_path_buf();
    let dest: PathBuf = natives_dir.to_path_buf();

    let written = tokio::task::spawn_blocking(move || extract_zip(&archive, &dest, 0))
        .await
        .map_err(|e| LauncherError::Worker(e.to_string()))??;

    debug!("Extracted {} native files into {:?}", written, natives_dir);
    Ok(written)
}
