use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ArtifactOutcome, Installer, StageReport};
use crate::core::assets::{AssetEntry, AssetIndex};
use crate::core::cache::{check_file, discard, place, verify_or_discard, write_file, ContentCache, FileCheck};
use crate::core::downloader::{join_url, ContentFetcher};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{AssetIndexRef, VersionDescriptor};

/// One object still missing after the local checks.
struct AssetTask {
    entry: AssetEntry,
    instance_path: PathBuf,
}

/// First error seen by any worker. Once set, workers stop taking new tasks;
/// in-flight downloads finish on their own.
#[derive(Default)]
struct FailureLatch {
    tripped: AtomicBool,
    first: std::sync::Mutex<Option<LauncherError>>,
}

impl FailureLatch {
    fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    fn trip(&self, err: LauncherError) {
        let mut slot = self.first.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
        self.tripped.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<LauncherError> {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

pub(super) async fn install_assets(
    installer: &Installer,
    fetcher: &ContentFetcher,
    descriptor: &VersionDescriptor,
) -> LauncherResult<StageReport> {
    let index = resolve_index(installer, fetcher, &descriptor.asset_index).await?;
    let entries = index.entries();

    let mut report = StageReport::default();
    let mut pending = Vec::new();
    for entry in entries {
        let task = AssetTask {
            instance_path: installer.layout.object_path(&entry.hash),
            entry,
        };
        match settle_locally(&installer.cache, &task).await? {
            Some(outcome) => report.record(outcome),
            None => pending.push(task),
        }
    }

    info!(
        "Assets: {} already in instance, {} from cache, {} to download",
        report.instance_valid,
        report.cache_hits,
        pending.len()
    );

    report.downloaded = download_all(installer, pending).await?;
    Ok(report)
}

/// Instance copy, then cache copy. A corrupt cache entry is dropped here so
/// the download that follows starts clean.
async fn settle_locally(
    cache: &ContentCache,
    task: &AssetTask,
) -> LauncherResult<Option<ArtifactOutcome>> {
    let hash = Some(task.entry.hash.as_str());
    if check_file(&task.instance_path, hash).await == FileCheck::Valid {
        return Ok(Some(ArtifactOutcome::InstanceValid));
    }

    let cached = cache.resolve_path(&task.entry.hash);
    match check_file(&cached, hash).await {
        FileCheck::Valid => {
            place(&cached, &task.instance_path).await?;
            Ok(Some(ArtifactOutcome::CacheHit))
        }
        FileCheck::Corrupt => {
            warn!("Cached object {} is corrupt, refetching", task.entry.hash);
            discard(&cached).await?;
            Ok(None)
        }
        FileCheck::Missing => Ok(None),
    }
}

/// Drain `tasks` with `min(workers, tasks)` workers, each with its own fetcher.
/// Returns the number of objects downloaded.
async fn download_all(installer: &Installer, tasks: Vec<AssetTask>) -> LauncherResult<usize> {
    if tasks.is_empty() {
        return Ok(0);
    }

    let worker_count = installer.config.worker_count().min(tasks.len());
    // All fetchers exist before the first worker starts.
    let fetchers = (0..worker_count)
        .map(|_| installer.fetcher())
        .collect::<LauncherResult<Vec<_>>>()?;
    debug!("Downloading {} assets with {} workers", tasks.len(), worker_count);

    let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
    let latch = Arc::new(FailureLatch::default());
    let downloaded = Arc::new(AtomicUsize::new(0));
    let mirrors: Arc<[String]> = installer.config.asset_mirrors.clone().into();

    let mut handles = Vec::with_capacity(worker_count);
    for fetcher in fetchers {
        let queue = queue.clone();
        let latch = latch.clone();
        let downloaded = downloaded.clone();
        let mirrors = mirrors.clone();
        let cache = installer.cache.clone();

        handles.push(tokio::spawn(async move {
            loop {
                if latch.is_tripped() {
                    break;
                }
                let Some(task) = queue.lock().await.pop_front() else {
                    break;
                };
                match download_one(&fetcher, &mirrors, &cache, &task).await {
                    Ok(()) => {
                        downloaded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!("Asset {} failed: {}", task.entry.hash, e);
                        latch.trip(e);
                    }
                }
            }
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            latch.trip(LauncherError::Worker(e.to_string()));
        }
    }

    if let Some(err) = latch.take() {
        return Err(LauncherError::AssetStage(Box::new(err)));
    }
    Ok(downloaded.load(Ordering::Relaxed))
}

async fn download_one(
    fetcher: &ContentFetcher,
    mirrors: &[String],
    cache: &ContentCache,
    task: &AssetTask,
) -> LauncherResult<()> {
    let hash = &task.entry.hash;
    let bytes = fetcher.fetch(mirrors, Some(&task.entry.relative_path)).await?;
    let cached = cache.store(hash, &bytes).await?;
    verify_or_discard(&cached, Some(hash)).await?;
    place(&cached, &task.instance_path).await
}

// ── Asset index ─────────────────────────────────────

/// Instance copy, then cache copy, then the declared URL with the mirror
/// fallback. A fresh download is saved to both the cache and the instance.
async fn resolve_index(
    installer: &Installer,
    fetcher: &ContentFetcher,
    index_ref: &AssetIndexRef,
) -> LauncherResult<AssetIndex> {
    let stem = index_ref.file_stem();
    let instance_path = installer.layout.index_path(&stem);
    let cache_path = installer.cache.index_path(&stem);

    if let Some(index) = read_index(&instance_path).await {
        debug!("Using asset index {:?}", instance_path);
        return Ok(index);
    }

    if let Some(index) = read_index(&cache_path).await {
        debug!("Using cached asset index {:?}", cache_path);
        match index.to_bytes() {
            Ok(bytes) => {
                if let Err(e) = write_file(&instance_path, &bytes).await {
                    warn!("Could not copy asset index into instance: {}", e);
                }
            }
            Err(e) => warn!("Could not serialize asset index: {}", e),
        }
        return Ok(index);
    }

    let bytes = match fetcher.fetch_url(&index_ref.url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let name = Some(index_ref.url_base_name())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| stem.clone());
            let fallback = join_url(
                &installer.config.fallback_meta_root,
                &format!("assets/indexes/{}.json", name),
            );
            warn!("Asset index {} unavailable ({}), trying {}", index_ref.url, e, fallback);
            fetcher.fetch_url(&fallback).await?
        }
    };

    let index = AssetIndex::parse(&bytes)?;
    let compact = index.to_bytes()?;
    write_file(&cache_path, &compact).await?;
    write_file(&instance_path, &compact).await?;
    info!("Fetched asset index {} ({} objects)", stem, index.object_count());
    Ok(index)
}

/// Unreadable or unparseable copies count as absent.
async fn read_index(path: &Path) -> Option<AssetIndex> {
    let bytes = tokio::fs::read(path).await.ok()?;
    match AssetIndex::parse(&bytes) {
        Ok(index) => Some(index),
        Err(e) => {
            warn!("Ignoring unreadable asset index {:?}: {}", path, e);
            None
        }
    }
}
