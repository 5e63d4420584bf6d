// ─── Installer Configuration ───
// Optional JSON file + environment overrides, everything defaulted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

const CACHE_DIR_NAME: &str = "tesuto-launcher";

pub const ENV_CACHE_DIR: &str = "TESUTO_CACHE_DIR";
pub const ENV_DL_THREADS: &str = "TESUTO_DL_THREADS";
pub const ENV_NET_TIMEOUT_MS: &str = "TESUTO_NET_TIMEOUT_MS";
pub const ENV_META_BASE: &str = "TESUTO_META_BASE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Shared content-addressed cache, reused by every instance.
    pub cache_root: PathBuf,
    /// Parallel workers for the asset stage.
    pub workers: usize,
    pub request_timeout_ms: u64,
    pub runtime_timeout_ms: u64,
    /// Roots that serve `<hash[0:2]>/<hash>`, tried in order.
    pub asset_mirrors: Vec<String>,
    /// Maven-layout roots used when a library's declared URL fails.
    pub library_mirrors: Vec<String>,
    /// Serves `v1/objects/<sha1>/client.jar`.
    pub client_object_root: String,
    /// Serves `assets/indexes/<name>.json`, `version/<id>` and `version/<id>/client`.
    pub fallback_meta_root: String,
    /// Roots that serve `mc/game/version_manifest_v2.json`, tried in order.
    pub manifest_roots: Vec<String>,
    pub runtime_api_base: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            workers: 8,
            request_timeout_ms: 12_000,
            runtime_timeout_ms: 120_000,
            asset_mirrors: vec![
                "https://resources.fastmcmirror.org".to_string(),
                "https://resources.download.minecraft.net".to_string(),
            ],
            library_mirrors: vec![
                "https://libraries.fastmcmirror.org".to_string(),
                "https://libraries.minecraft.net".to_string(),
            ],
            client_object_root: "https://piston-data.mojang.com".to_string(),
            fallback_meta_root: "https://bmclapi2.bangbang93.com".to_string(),
            manifest_roots: vec![
                "https://piston-meta.mojang.com".to_string(),
                "https://bmclapi2.bangbang93.com".to_string(),
            ],
            runtime_api_base: "https://api.adoptium.net/v3".to_string(),
        }
    }
}

impl InstallerConfig {
    /// Load from a JSON file, falling back to defaults when the file is absent,
    /// then apply environment overrides.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<InstallerConfig>(&raw)?,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!("No installer config at {:?}, using defaults", path);
                Self::default()
            }
            Err(source) => return Err(LauncherError::io(path, source)),
        };
        Ok(config.apply_env())
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var(ENV_CACHE_DIR).filter(|v| !v.trim().is_empty()) {
            self.cache_root = PathBuf::from(dir);
        }
        if let Some(raw) = var(ENV_DL_THREADS) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => warn!("Ignoring invalid {}={:?}", ENV_DL_THREADS, raw),
            }
        }
        if let Some(raw) = var(ENV_NET_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.request_timeout_ms = ms,
                _ => warn!("Ignoring invalid {}={:?}", ENV_NET_TIMEOUT_MS, raw),
            }
        }
        if let Some(base) = var(ENV_META_BASE).filter(|v| !v.trim().is_empty()) {
            let base = base.trim().trim_end_matches('/').to_string();
            self.manifest_roots.retain(|root| root != &base);
            self.manifest_roots.insert(0, base);
        }
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime_timeout_ms)
    }
}

fn default_cache_root() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}
