// ─── Version Descriptor ───
// What the install pipeline consumes: everything needed to provision one
// version, with platform rules already applied. Rebuilt for every run.

use std::path::{Component, Path};

use crate::core::cache::is_sha1_hex;
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone)]
pub struct VersionDescriptor {
    pub id: String,
    pub main_class: String,
    pub asset_index: AssetIndexRef,
    pub client: ClientArchiveRef,
    pub libraries: Vec<LibraryEntry>,
    /// Untouched version JSON, persisted next to the client archive.
    pub raw: serde_json::Value,
}

impl VersionDescriptor {
    /// The version id and the asset index stem become file names under the
    /// instance and the cache, so each must be one plain path segment.
    pub fn ensure_safe_names(&self) -> LauncherResult<()> {
        ensure_segment("version id", &self.id)?;
        ensure_segment("asset index id", &self.asset_index.file_stem())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
}

impl AssetIndexRef {
    /// Last URL segment without its extension (`.../17.json` -> `17`).
    pub fn url_base_name(&self) -> String {
        let last = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .next()
            .unwrap_or_default();
        last.strip_suffix(".json").unwrap_or(last).to_string()
    }

    /// Name of the index file on disk: the declared id, else the URL base name.
    pub fn file_stem(&self) -> String {
        if self.id.is_empty() {
            self.url_base_name()
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientArchiveRef {
    pub url: String,
    pub sha1: Option<String>,
}

/// A path-addressed library artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    /// Maven-style path relative to `libraries/`, `/`-separated.
    pub path: String,
    pub url: String,
    pub sha1: Option<String>,
    /// Archive whose contents get extracted into the natives directory.
    pub is_native: bool,
}

impl LibraryEntry {
    pub fn new(
        path: impl Into<String>,
        url: impl Into<String>,
        sha1: Option<String>,
        is_native: bool,
    ) -> LauncherResult<Self> {
        let path = path.into();
        ensure_relative(&path)?;
        Ok(Self {
            path,
            url: url.into(),
            sha1: normalize_sha1(sha1),
            is_native,
        })
    }
}

/// Blank hashes mean "no hash". Declared hashes are compared lowercase.
pub fn normalize_sha1(sha1: Option<String>) -> Option<String> {
    sha1.map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
}

/// A declared hash usable for content addressing.
pub fn addressable_sha1(sha1: Option<&str>) -> Option<&str> {
    sha1.filter(|s| is_sha1_hex(s))
}

fn ensure_segment(what: &str, name: &str) -> LauncherResult<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    );
    if !single {
        return Err(LauncherError::Descriptor(format!(
            "{} must be a plain file name: {:?}",
            what, name
        )));
    }
    Ok(())
}

fn ensure_relative(path: &str) -> LauncherResult<()> {
    let candidate = Path::new(path);
    let escapes = path.is_empty()
        || candidate.is_absolute()
        || candidate
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(LauncherError::Descriptor(format!(
            "library path must stay inside libraries/: {:?}",
            path
        )));
    }
    Ok(())
}
