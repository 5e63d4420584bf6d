// ─── Version Manifest ───
// Fetches the version manifest v2 and resolves a version id into a
// `VersionDescriptor`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::descriptor::VersionDescriptor;
use super::version_file::VersionJson;
use crate::core::config::InstallerConfig;
use crate::core::downloader::{join_url, ContentFetcher, TransportFactory};
use crate::core::error::{LauncherError, LauncherResult};

const VERSION_MANIFEST_PATH: &str = "mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    pub url: String,
}

impl VersionManifest {
    /// Fetch the manifest from the first root that serves a parseable one.
    pub async fn fetch(fetcher: &ContentFetcher, roots: &[String]) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");

        for root in roots {
            let url = join_url(root, VERSION_MANIFEST_PATH);
            let parsed = match fetcher.fetch_url(&url).await {
                Ok(bytes) => serde_json::from_slice::<VersionManifest>(&bytes)
                    .map_err(LauncherError::from),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(manifest) => {
                    info!("Loaded {} versions from manifest", manifest.versions.len());
                    return Ok(manifest);
                }
                Err(e) => warn!("[manifest] {} failed: {}", url, e),
            }
        }

        Err(LauncherError::AllMirrorsFailed {
            target: VERSION_MANIFEST_PATH.to_string(),
        })
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id && !v.url.is_empty())
    }
}

/// Turns a version id into a descriptor. The install pipeline only consumes
/// descriptors; where they come from is up to the implementation.
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    async fn resolve(&self, version_id: &str) -> LauncherResult<VersionDescriptor>;
}

/// Resolves against the official manifest, then the fallback meta mirror.
pub struct MojangResolver {
    fetcher: ContentFetcher,
    manifest_roots: Vec<String>,
    fallback_meta_root: String,
}

impl MojangResolver {
    pub fn new(config: &InstallerConfig, transports: &dyn TransportFactory) -> LauncherResult<Self> {
        Ok(Self {
            fetcher: ContentFetcher::new(transports.create()?, config.request_timeout()),
            manifest_roots: config.manifest_roots.clone(),
            fallback_meta_root: config.fallback_meta_root.clone(),
        })
    }

    async fn fetch_version_json(&self, url: &str) -> LauncherResult<VersionDescriptor> {
        let bytes = self.fetcher.fetch_url(url).await?;
        let raw: serde_json::Value = serde_json::from_slice(&bytes)?;
        if !raw.is_object() {
            return Err(LauncherError::Descriptor(format!(
                "version JSON at {} is not an object",
                url
            )));
        }
        VersionJson::into_descriptor(raw)
    }
}

#[async_trait]
impl ManifestResolver for MojangResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, version_id: &str) -> LauncherResult<VersionDescriptor> {
        let manifest = VersionManifest::fetch(&self.fetcher, &self.manifest_roots).await?;

        if let Some(entry) = manifest.find_version(version_id) {
            info!("Resolving {} ({})", entry.id, entry.version_type);
            return self.fetch_version_json(&entry.url).await;
        }

        warn!(
            "Version {} not in manifest, trying {}",
            version_id, self.fallback_meta_root
        );
        let url = join_url(&self.fallback_meta_root, &format!("version/{}", version_id));
        self.fetch_version_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::testing::MemoryNetwork;

    fn config() -> InstallerConfig {
        InstallerConfig {
            manifest_roots: vec!["http://meta-a".into(), "http://meta-b".into()],
            fallback_meta_root: "http://fallback".into(),
            ..InstallerConfig::default()
        }
    }

    fn version_json(id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": id,
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": { "id": "17", "url": "http://meta-a/indexes/17.json" },
            "downloads": { "client": { "url": "http://meta-a/client.jar" } }
        }))
        .unwrap()
    }

    #[test]
    fn deserialize_manifest_entry() {
        let json = r#"{
            "id": "1.20.4",
            "type": "release",
            "url": "https://example.com/1.20.4.json",
            "sha1": "abc123"
        }"#;
        let entry: VersionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "1.20.4");
        assert_eq!(entry.version_type, "release");
    }

    #[tokio::test]
    async fn resolves_through_second_manifest_root() {
        let network = MemoryNetwork::new();
        network.serve(
            "http://meta-b/mc/game/version_manifest_v2.json",
            br#"{"versions":[{"id":"1.21.1","type":"release","url":"http://meta-b/v/1.21.1.json"}]}"#
                .to_vec(),
        );
        network.serve("http://meta-b/v/1.21.1.json", version_json("1.21.1"));

        let resolver = MojangResolver::new(&config(), &network).unwrap();
        let descriptor = resolver.resolve("1.21.1").await.unwrap();

        assert_eq!(descriptor.id, "1.21.1");
        assert_eq!(descriptor.asset_index.id, "17");
    }

    #[tokio::test]
    async fn unknown_version_uses_fallback_meta() {
        let network = MemoryNetwork::new();
        network.serve(
            "http://meta-a/mc/game/version_manifest_v2.json",
            br#"{"versions":[]}"#.to_vec(),
        );
        network.serve("http://fallback/version/rd-132211", version_json("rd-132211"));

        let resolver = MojangResolver::new(&config(), &network).unwrap();
        let descriptor = resolver.resolve("rd-132211").await.unwrap();
        assert_eq!(descriptor.id, "rd-132211");
    }

    #[tokio::test]
    async fn no_manifest_anywhere_fails() {
        let network = MemoryNetwork::new();
        let resolver = MojangResolver::new(&config(), &network).unwrap();
        let err = resolver.resolve("1.21.1").await.unwrap_err();
        assert!(matches!(err, LauncherError::AllMirrorsFailed { .. }));
    }
}
