use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::cache::object_relative_path;
use crate::core::error::{LauncherError, LauncherResult};

/// Mod loader kind recorded in the install marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    #[serde(alias = "none", alias = "")]
    Vanilla,
    Forge,
    Fabric,
    NeoForge,
    Quilt,
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "vanilla"),
            LoaderType::Forge => write!(f, "forge"),
            LoaderType::Fabric => write!(f, "fabric"),
            LoaderType::NeoForge => write!(f, "neoforge"),
            LoaderType::Quilt => write!(f, "quilt"),
        }
    }
}

impl std::str::FromStr for LoaderType {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "vanilla" => Ok(LoaderType::Vanilla),
            "forge" => Ok(LoaderType::Forge),
            "fabric" => Ok(LoaderType::Fabric),
            "neoforge" => Ok(LoaderType::NeoForge),
            "quilt" => Ok(LoaderType::Quilt),
            other => Err(LauncherError::Descriptor(format!(
                "unknown mod loader: {}",
                other
            ))),
        }
    }
}

/// On-disk layout of one instance. Downstream tooling reads these paths, so
/// they must not change:
///
/// - `assets/objects/<hash[0:2]>/<hash>`
/// - `assets/indexes/<indexId>.json`
/// - `libraries/<mavenPath>`
/// - `versions/<id>/<id>.jar`, `versions/<id>/<id>.json`, `versions/<id>/natives/`
#[derive(Debug, Clone)]
pub struct InstanceLayout {
    root: PathBuf,
}

impl InstanceLayout {
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

    pub fn object_path(&self, hash: &str) -> PathBuf {
        self.objects_dir().join(object_relative_path(hash))
    }

    pub fn index_path(&self, index_id: &str) -> PathBuf {
        self.indexes_dir().join(format!("{}.json", index_id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn library_path(&self, relative: &str) -> PathBuf {
        self.libraries_dir().join(relative)
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir().join(version_id)
    }

    pub fn client_jar_path(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{}.jar", version_id))
    }

    pub fn version_json_path(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{}.json", version_id))
    }

    /// Path to the per-version `natives` folder.
    pub fn natives_dir(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join("natives")
    }

    pub async fn ensure_layout(&self) -> LauncherResult<()> {
        for dir in [
            self.objects_dir(),
            self.indexes_dir(),
            self.libraries_dir(),
            self.versions_dir(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| LauncherError::io(&dir, e))?;
        }
        Ok(())
    }
}
