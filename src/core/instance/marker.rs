// ─── Install Marker ───
// Small record of the last successful install, written after the pipeline
// finishes. Matching fields alone never prove an install is intact; callers
// also re-check the client archive (see `needs_install`).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::model::{InstanceLayout, LoaderType};
use crate::core::error::{LauncherError, LauncherResult};

pub const MARKER_FILE: &str = ".tesuto_installed.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModloaderSpec {
    #[serde(default)]
    pub kind: LoaderType,
    #[serde(default)]
    pub version: Option<String>,
}

impl ModloaderSpec {
    pub fn vanilla() -> Self {
        Self::default()
    }

    pub fn new(kind: LoaderType, version: Option<String>) -> Self {
        Self { kind, version }
    }

    fn same_as(&self, other: &ModloaderSpec) -> bool {
        self.kind == other.kind
            && self.version.as_deref().unwrap_or_default()
                == other.version.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallMarker {
    pub version_id: String,
    #[serde(default)]
    pub modloader: ModloaderSpec,
    pub installed_at: DateTime<Utc>,
}

impl InstallMarker {
    pub fn new(version_id: impl Into<String>, modloader: ModloaderSpec) -> Self {
        Self {
            version_id: version_id.into(),
            modloader,
            installed_at: Utc::now(),
        }
    }

    pub fn path(instance_dir: &Path) -> PathBuf {
        instance_dir.join(MARKER_FILE)
    }

    /// Absent or unreadable markers are treated as "never installed".
    pub async fn load(instance_dir: &Path) -> Option<Self> {
        let path = Self::path(instance_dir);
        let raw = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!("Ignoring corrupt install marker {:?}: {}", path, e);
                None
            }
        }
    }

    pub async fn save(&self, instance_dir: &Path) -> LauncherResult<()> {
        let path = Self::path(instance_dir);
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| LauncherError::io(&path, e))
    }

    pub fn matches(&self, version_id: &str, modloader: &ModloaderSpec) -> bool {
        self.version_id == version_id && self.modloader.same_as(modloader)
    }
}

/// Whether the pipeline has to run before launching `version_id`.
pub async fn needs_install(
    layout: &InstanceLayout,
    version_id: &str,
    modloader: &ModloaderSpec,
) -> bool {
    let client = layout.client_jar_path(version_id);
    if !tokio::fs::try_exists(&client).await.unwrap_or(false) {
        debug!("Client archive {:?} missing, install required", client);
        return true;
    }
    match InstallMarker::load(layout.root()).await {
        Some(marker) => !marker.matches(version_id, modloader),
        None => true,
    }
}
