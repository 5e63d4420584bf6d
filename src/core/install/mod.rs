// ─── Install Pipeline ───
// Provisions one version into one instance directory:
//
//   assets (parallel) → libraries (+ natives) → client archive + version JSON
//
// Every artifact resolves the same way: valid instance copy, else valid cache
// copy placed into the instance, else download into the cache, verify, place.
// Stages run strictly in order; the first failing stage aborts the install.

mod assets;
mod client;
mod libraries;
pub mod natives;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument};

use crate::core::cache::ContentCache;
use crate::core::config::InstallerConfig;
use crate::core::downloader::{ContentFetcher, HttpTransportFactory, TransportFactory};
use crate::core::error::LauncherResult;
use crate::core::instance::{needs_install, InstallMarker, InstanceLayout, ModloaderSpec};
use crate::core::version::VersionDescriptor;

/// How one artifact ended up valid in the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOutcome {
    InstanceValid,
    CacheHit,
    Downloaded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub instance_valid: usize,
    pub cache_hits: usize,
    pub downloaded: usize,
}

impl StageReport {
    pub fn record(&mut self, outcome: ArtifactOutcome) {
        match outcome {
            ArtifactOutcome::InstanceValid => self.instance_valid += 1,
            ArtifactOutcome::CacheHit => self.cache_hits += 1,
            ArtifactOutcome::Downloaded => self.downloaded += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.instance_valid + self.cache_hits + self.downloaded
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub version_id: String,
    pub assets: StageReport,
    pub libraries: StageReport,
    /// Native archives unpacked during this run.
    pub natives_extracted: usize,
    pub client_downloaded: bool,
    pub elapsed_ms: u128,
}

pub struct Installer {
    config: InstallerConfig,
    layout: InstanceLayout,
    cache: ContentCache,
    transports: Arc<dyn TransportFactory>,
}

impl Installer {
    pub fn new(instance_dir: impl Into<PathBuf>, config: InstallerConfig) -> Self {
        let cache = ContentCache::new(config.cache_root.clone());
        Self {
            layout: InstanceLayout::new(instance_dir),
            cache,
            config,
            transports: Arc::new(HttpTransportFactory),
        }
    }

    /// Swap the transport source (tests use an in-memory network).
    pub fn with_transports(mut self, transports: Arc<dyn TransportFactory>) -> Self {
        self.transports = transports;
        self
    }

    pub fn layout(&self) -> &InstanceLayout {
        &self.layout
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// A fetcher with a transport of its own.
    fn fetcher(&self) -> LauncherResult<ContentFetcher> {
        Ok(ContentFetcher::new(
            self.transports.create()?,
            self.config.request_timeout(),
        ))
    }

    /// Run all three stages for `descriptor`.
    #[instrument(skip_all, fields(version = %descriptor.id))]
    pub async fn install(&self, descriptor: &VersionDescriptor) -> LauncherResult<InstallReport> {
        let started = Instant::now();
        descriptor.ensure_safe_names()?;
        self.layout.ensure_layout().await?;
        self.cache.ensure_layout().await?;

        let fetcher = self.fetcher()?;

        info!("Installing assets for {}", descriptor.id);
        let assets = assets::install_assets(self, &fetcher, descriptor).await?;

        info!("Installing {} libraries", descriptor.libraries.len());
        let (libraries, natives_extracted) =
            libraries::install_libraries(self, &fetcher, descriptor).await?;

        let client_downloaded = client::install_client(self, &fetcher, descriptor).await?;

        let report = InstallReport {
            version_id: descriptor.id.clone(),
            assets,
            libraries,
            natives_extracted,
            client_downloaded,
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            "Installed {} in {} ms ({} assets downloaded, {} libraries downloaded)",
            descriptor.id, report.elapsed_ms, report.assets.downloaded, report.libraries.downloaded
        );
        Ok(report)
    }

    /// Install only when the marker or the client archive says so, then
    /// record the marker. `None` means the instance was already current.
    pub async fn ensure_installed(
        &self,
        descriptor: &VersionDescriptor,
        modloader: &ModloaderSpec,
    ) -> LauncherResult<Option<InstallReport>> {
        if !needs_install(&self.layout, &descriptor.id, modloader).await {
            info!("Instance already has {} ({})", descriptor.id, modloader.kind);
            return Ok(None);
        }

        let report = self.install(descriptor).await?;
        InstallMarker::new(&descriptor.id, modloader.clone())
            .save(self.layout.root())
            .await?;
        Ok(Some(report))
    }

    /// Launch classpath: non-native libraries in descriptor order, then the client.
    pub fn classpath(&self, descriptor: &VersionDescriptor) -> Vec<PathBuf> {
        descriptor
            .libraries
            .iter()
            .filter(|lib| !lib.is_native)
            .map(|lib| self.layout.library_path(&lib.path))
            .chain(std::iter::once(self.layout.client_jar_path(&descriptor.id)))
            .collect()
    }
}
