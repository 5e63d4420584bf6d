use std::path::Path;

use tracing::{debug, warn};

use super::natives::extract_natives;
use super::{ArtifactOutcome, Installer, StageReport};
use crate::core::cache::{check_file, discard, place, verify_or_discard, FileCheck};
use crate::core::downloader::ContentFetcher;
use crate::core::error::LauncherResult;
use crate::core::version::{LibraryEntry, VersionDescriptor};

/// Sequential, in descriptor order. Returns the stage counters and how many
/// native archives were unpacked.
pub(super) async fn install_libraries(
    installer: &Installer,
    fetcher: &ContentFetcher,
    descriptor: &VersionDescriptor,
) -> LauncherResult<(StageReport, usize)> {
    let natives_dir = installer.layout.natives_dir(&descriptor.id);
    let mut report = StageReport::default();
    let mut natives = 0;

    for library in &descriptor.libraries {
        let instance_path = installer.layout.library_path(&library.path);
        let outcome = install_library(installer, fetcher, library, &instance_path).await?;
        report.record(outcome);

        // Natives already valid in the instance were extracted by an earlier run.
        if library.is_native && outcome != ArtifactOutcome::InstanceValid {
            if let Err(e) = extract_natives(&instance_path, &natives_dir).await {
                drop_unusable_native(installer, library, &instance_path).await?;
                return Err(e);
            }
            natives += 1;
        }
    }

    debug!(
        "Libraries: {} in instance, {} from cache, {} downloaded",
        report.instance_valid, report.cache_hits, report.downloaded
    );
    Ok((report, natives))
}

async fn install_library(
    installer: &Installer,
    fetcher: &ContentFetcher,
    library: &LibraryEntry,
    instance_path: &Path,
) -> LauncherResult<ArtifactOutcome> {
    let expected = library.sha1.as_deref();
    if check_file(instance_path, expected).await == FileCheck::Valid {
        return Ok(ArtifactOutcome::InstanceValid);
    }

    let cached = installer.cache.library_path(&library.path);
    match check_file(&cached, expected).await {
        FileCheck::Valid => {
            place(&cached, instance_path).await?;
            return Ok(ArtifactOutcome::CacheHit);
        }
        FileCheck::Corrupt => {
            warn!("Cached library {} is corrupt, refetching", library.path);
            discard(&cached).await?;
        }
        FileCheck::Missing => {}
    }

    let bytes = download(installer, fetcher, library).await?;
    let cached = installer.cache.store_library(&library.path, &bytes).await?;
    verify_or_discard(&cached, expected).await?;
    place(&cached, instance_path).await?;
    Ok(ArtifactOutcome::Downloaded)
}

/// A native archive that cannot be unpacked must not survive as a valid
/// instance copy. Without a declared hash the cached copy is just as
/// unverifiable, so it goes too.
async fn drop_unusable_native(
    installer: &Installer,
    library: &LibraryEntry,
    instance_path: &Path,
) -> LauncherResult<()> {
    warn!("Native archive {} could not be extracted, removing it", library.path);
    discard(instance_path).await?;
    if library.sha1.is_none() {
        discard(&installer.cache.library_path(&library.path)).await?;
    }
    Ok(())
}

/// Declared URL first, then the maven mirrors with the library path.
async fn download(
    installer: &Installer,
    fetcher: &ContentFetcher,
    library: &LibraryEntry,
) -> LauncherResult<Vec<u8>> {
    if !library.url.is_empty() {
        match fetcher.fetch_url(&library.url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => warn!("Library {} failed at its own URL: {}", library.path, e),
        }
    }
    fetcher
        .fetch(&installer.config.library_mirrors, Some(&library.path))
        .await
}
