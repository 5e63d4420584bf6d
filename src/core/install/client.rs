use tracing::{debug, info, warn};

use super::Installer;
use crate::core::cache::{is_valid, verify_or_discard, write_file};
use crate::core::downloader::{join_url, ContentFetcher};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::descriptor::addressable_sha1;
use crate::core::version::VersionDescriptor;

/// Make sure `versions/<id>/<id>.jar` is valid and rewrite `<id>.json`.
/// Returns whether the archive had to be downloaded.
pub(super) async fn install_client(
    installer: &Installer,
    fetcher: &ContentFetcher,
    descriptor: &VersionDescriptor,
) -> LauncherResult<bool> {
    let id = &descriptor.id;
    let jar = installer.layout.client_jar_path(id);
    let expected = descriptor.client.sha1.as_deref();

    let downloaded = if is_valid(&jar, expected).await {
        debug!("Client archive {:?} is valid", jar);
        false
    } else {
        let bytes = fetch_client(installer, fetcher, descriptor).await?;
        write_file(&jar, &bytes).await?;
        verify_or_discard(&jar, expected).await?;
        info!("Client archive for {} saved ({} bytes)", id, bytes.len());
        true
    };

    let json = serde_json::to_vec_pretty(&descriptor.raw)?;
    write_file(&installer.layout.version_json_path(id), &json).await?;
    Ok(downloaded)
}

/// Declared URL, then the object store by hash, then the metadata mirror.
async fn fetch_client(
    installer: &Installer,
    fetcher: &ContentFetcher,
    descriptor: &VersionDescriptor,
) -> LauncherResult<Vec<u8>> {
    let config = &installer.config;
    let client = &descriptor.client;

    if !client.url.is_empty() {
        match fetcher.fetch_url(&client.url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => warn!("Client archive failed at {}: {}", client.url, e),
        }
    }

    if let Some(sha1) = addressable_sha1(client.sha1.as_deref()) {
        let url = join_url(
            &config.client_object_root,
            &format!("v1/objects/{}/client.jar", sha1),
        );
        match fetcher.fetch_url(&url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => warn!("Client archive failed at {}: {}", url, e),
        }
    }

    let url = join_url(
        &config.fallback_meta_root,
        &format!("version/{}/client", descriptor.id),
    );
    fetcher.fetch_url(&url).await.map_err(|e| {
        warn!("Client archive failed at {}: {}", url, e);
        LauncherError::AllMirrorsFailed {
            target: format!("client archive {}", descriptor.id),
        }
    })
}
