// ─── Version File ───
// Parses a Mojang version JSON, evaluates OS rules for libraries and turns the
// result into a `VersionDescriptor`.

use serde::Deserialize;
use tracing::debug;

use super::descriptor::{
    normalize_sha1, AssetIndexRef, ClientArchiveRef, LibraryEntry, VersionDescriptor,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;

/// The subset of a Mojang version JSON the installer needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<VersionLibrary>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexInfo {
    #[serde(default)]
    pub id: String,
    pub url: String,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Deserialize)]
pub struct VersionLibrary {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default)]
    pub natives: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct LibDownloadArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub url: String,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl VersionLibrary {
    /// Evaluate whether this library should be included for the current OS.
    ///
    /// Rules logic, as the vanilla launcher applies it:
    /// - If no rules → allowed.
    /// - Process rules top-to-bottom. Start with "disallowed".
    /// - Each rule either sets "allow" or "disallow" if the OS matches (or if no OS is specified).
    /// - Final state determines inclusion.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let rules = match &self.rules {
            Some(r) => r,
            None => return true,
        };

        let current_os = current_os_name();
        let mut allowed = false;

        for rule in rules {
            let os_matches = match &rule.os {
                None => true,
                Some(os) => match &os.name {
                    None => true,
                    Some(name) => name == current_os,
                },
            };

            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }

        allowed
    }

    /// Classifier declared in the `natives` map for the current OS.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let natives = self.natives.as_ref()?;
        natives.get(current_os_name())?.as_str().map(|s| {
            let arch = if cfg!(target_pointer_width = "64") {
                "64"
            } else {
                "32"
            };
            s.replace("${arch}", arch)
        })
    }

    /// The classifier object to install as a native for this platform, if any.
    fn native_download(&self) -> Option<(&serde_json::Map<String, serde_json::Value>, String)> {
        let classifiers = self.downloads.as_ref()?.classifiers.as_ref()?;

        let mut keys = Vec::new();
        if let Some(declared) = self.native_classifier_for_current_os() {
            keys.push(declared);
        }
        keys.extend(fallback_native_keys());

        keys.into_iter().find_map(|key| {
            classifiers
                .get(&key)
                .and_then(|value| value.as_object())
                .map(|obj| (obj, key))
        })
    }

    fn maven_path(&self, classifier: Option<&str>) -> LauncherResult<String> {
        let mut artifact = MavenArtifact::parse(&self.name)?;
        if let Some(classifier) = classifier {
            artifact.classifier = Some(classifier.to_string());
        }
        Ok(artifact.relative_path())
    }

    /// Artifact and native entries contributed by this library.
    fn entries(&self) -> LauncherResult<Vec<LibraryEntry>> {
        let mut out = Vec::new();

        if let Some(artifact) = self
            .downloads
            .as_ref()
            .and_then(|downloads| downloads.artifact.as_ref())
        {
            let path = match artifact.path.as_deref().filter(|p| !p.is_empty()) {
                Some(path) => path.to_string(),
                None => self.maven_path(None)?,
            };
            out.push(LibraryEntry::new(
                path,
                artifact.url.clone(),
                artifact.sha1.clone(),
                false,
            )?);
        }

        if let Some((native, classifier)) = self.native_download() {
            let field = |key: &str| {
                native
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string)
            };
            let path = match field("path").filter(|p| !p.is_empty()) {
                Some(path) => path,
                None => self.maven_path(Some(&classifier))?,
            };
            out.push(LibraryEntry::new(
                path,
                field("url").unwrap_or_default(),
                field("sha1"),
                true,
            )?);
        }

        Ok(out)
    }
}

/// Get the Mojang OS name for the current platform.
pub(crate) fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// Classifier keys probed when the `natives` map does not name one.
fn fallback_native_keys() -> Vec<String> {
    let os_aliases: &[&str] = match current_os_name() {
        "osx" => &["osx", "macos"],
        "windows" => &["windows"],
        _ => &["linux"],
    };
    let arch = std::env::consts::ARCH;

    let mut keys = Vec::new();
    for os in os_aliases {
        keys.push(format!("natives-{os}-{arch}"));
        keys.push(format!("natives-{os}-x86_64"));
        keys.push(format!("natives-{os}-amd64"));
        keys.push(format!("natives-{os}"));
    }
    keys
}

impl VersionJson {
    /// Build the descriptor from a raw version JSON document.
    pub fn into_descriptor(raw: serde_json::Value) -> LauncherResult<VersionDescriptor> {
        let parsed: VersionJson = serde_json::from_value(raw.clone())?;

        let id = parsed
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LauncherError::Descriptor("version JSON has no id".into()))?;

        let asset_index = parsed.asset_index.ok_or_else(|| {
            LauncherError::Descriptor(format!("version {} has no assetIndex", id))
        })?;

        let client = parsed
            .downloads
            .and_then(|d| d.client)
            .map(|c| ClientArchiveRef {
                url: c.url,
                sha1: normalize_sha1(c.sha1),
            })
            .ok_or_else(|| {
                LauncherError::Descriptor(format!("version {} has no client download", id))
            })?;

        let mut libraries = Vec::new();
        for lib in &parsed.libraries {
            if !lib.is_allowed_for_current_os() {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }
            libraries.extend(lib.entries()?);
        }

        let descriptor = VersionDescriptor {
            main_class: parsed.main_class.unwrap_or_default(),
            asset_index: AssetIndexRef {
                id: asset_index.id,
                url: asset_index.url,
            },
            client,
            libraries,
            raw,
            id,
        };
        descriptor.ensure_safe_names()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(rules: Option<Vec<LibraryRule>>) -> VersionLibrary {
        VersionLibrary {
            name: "test:lib:1.0".into(),
            downloads: None,
            rules,
            natives: None,
        }
    }

    #[test]
    fn no_rules_means_allowed() {
        assert!(library(None).is_allowed_for_current_os());
    }

    #[test]
    fn allow_only_current_os() {
        let lib = library(Some(vec![LibraryRule {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: Some(current_os_name().to_string()),
            }),
        }]));
        assert!(lib.is_allowed_for_current_os());
    }

    #[test]
    fn disallow_current_os() {
        let lib = library(Some(vec![
            LibraryRule {
                action: RuleAction::Allow,
                os: None,
            },
            LibraryRule {
                action: RuleAction::Disallow,
                os: Some(OsRule {
                    name: Some(current_os_name().to_string()),
                }),
            },
        ]));
        assert!(!lib.is_allowed_for_current_os());
    }

    fn sample_version() -> serde_json::Value {
        let mut natives = serde_json::Map::new();
        natives.insert(current_os_name().to_string(), "natives-custom".into());
        serde_json::json!({
            "id": "1.12.2",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": { "id": "1.12", "url": "https://meta.example/indexes/1.12.json" },
            "downloads": {
                "client": { "sha1": "0F275BC1547D01FA5F56BA34BDC87D981EE12DAF", "url": "https://x/client.jar" }
            },
            "libraries": [
                {
                    "name": "com.mojang:brigadier:1.0.18",
                    "downloads": { "artifact": {
                        "path": "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar",
                        "sha1": "c1ef1234c1ef1234c1ef1234c1ef1234c1ef1234",
                        "url": "https://libs.example/brigadier-1.0.18.jar"
                    } }
                },
                {
                    "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
                    "natives": natives,
                    "downloads": { "classifiers": {
                        "natives-custom": { "url": "https://libs.example/native.jar", "sha1": "" }
                    } }
                },
                {
                    "name": "only:elsewhere:1.0",
                    "rules": [ { "action": "allow", "os": { "name": "nowhere" } } ],
                    "downloads": { "artifact": { "url": "https://libs.example/x.jar" } }
                }
            ]
        })
    }

    #[test]
    fn descriptor_from_version_json() {
        let d = VersionJson::into_descriptor(sample_version()).unwrap();

        assert_eq!(d.id, "1.12.2");
        assert_eq!(d.asset_index.id, "1.12");
        assert_eq!(
            d.client.sha1.as_deref(),
            Some("0f275bc1547d01fa5f56ba34bdc87d981ee12daf")
        );
        assert_eq!(d.libraries.len(), 2);

        let plain = &d.libraries[0];
        assert!(!plain.is_native);
        assert_eq!(plain.path, "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar");

        let native = &d.libraries[1];
        assert!(native.is_native);
        assert_eq!(native.sha1, None);
        assert_eq!(
            native.path,
            "org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-custom.jar"
        );
        assert_eq!(d.raw["mainClass"], "net.minecraft.client.main.Main");
    }

    #[test]
    fn missing_asset_index_is_descriptor_error() {
        let raw = serde_json::json!({
            "id": "x",
            "downloads": { "client": { "url": "https://x/client.jar" } }
        });
        let err = VersionJson::into_descriptor(raw).unwrap_err();
        assert!(matches!(err, LauncherError::Descriptor(_)));
    }

    #[test]
    fn traversal_in_ids_is_descriptor_error() {
        let mut raw = sample_version();
        raw["id"] = "../../escaped".into();
        let err = VersionJson::into_descriptor(raw).unwrap_err();
        assert!(matches!(err, LauncherError::Descriptor(_)));

        let mut raw = sample_version();
        raw["assetIndex"]["id"] = "../../../idx".into();
        let err = VersionJson::into_descriptor(raw).unwrap_err();
        assert!(matches!(err, LauncherError::Descriptor(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_native_found_by_fallback_key() {
        let raw = serde_json::json!({
            "id": "x",
            "assetIndex": { "id": "1", "url": "https://x/1.json" },
            "downloads": { "client": { "url": "https://x/client.jar" } },
            "libraries": [{
                "name": "org.lwjgl:lwjgl:3.2.2",
                "downloads": { "classifiers": {
                    "natives-linux": { "path": "org/lwjgl/lwjgl/3.2.2/lwjgl-3.2.2-natives-linux.jar", "url": "https://x/n.jar" }
                } }
            }]
        });
        let d = VersionJson::into_descriptor(raw).unwrap();
        assert_eq!(d.libraries.len(), 1);
        assert!(d.libraries[0].is_native);
    }
}
