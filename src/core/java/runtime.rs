use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::core::archive::{extract_tar_gz, extract_zip};
use crate::core::cache::write_file;
use crate::core::config::InstallerConfig;
use crate::core::downloader::{join_url, ContentFetcher, HttpTransportFactory, TransportFactory};
use crate::core::error::{LauncherError, LauncherResult};

use platform::{ArchiveFormat, PlatformTarget};

/// Downloads a Temurin JRE for one Java major version and unpacks it under
/// `<dest_base>/java-<major>`.
pub struct RuntimeProvisioner {
    api_base: String,
    cache_root: PathBuf,
    timeout: Duration,
    target: Option<PlatformTarget>,
    transports: Arc<dyn TransportFactory>,
}

impl RuntimeProvisioner {
    pub fn new(config: &InstallerConfig) -> Self {
        Self {
            api_base: config.runtime_api_base.clone(),
            cache_root: config.cache_root.clone(),
            timeout: config.runtime_timeout(),
            target: PlatformTarget::current(),
            transports: Arc::new(HttpTransportFactory),
        }
    }

    pub fn with_transports(mut self, transports: Arc<dyn TransportFactory>) -> Self {
        self.transports = transports;
        self
    }

    /// Provision for another platform than the running one.
    pub fn with_target(mut self, target: Option<PlatformTarget>) -> Self {
        self.target = target;
        self
    }

    /// Fetch, cache and extract the runtime. Returns the java executable, or
    /// `None` on a platform with no packaged runtime.
    #[instrument(skip(self, dest_base))]
    pub async fn provision(&self, major: u32, dest_base: &Path) -> LauncherResult<Option<PathBuf>> {
        let Some(target) = self.target else {
            warn!(
                "No packaged Java runtime for {}/{}, skipping",
                std::env::consts::OS,
                std::env::consts::ARCH
            );
            return Ok(None);
        };

        let url = target.endpoint(&self.api_base, major);
        info!("Downloading Java {} runtime from {}", major, url);

        let fetcher = ContentFetcher::new(self.transports.create()?, self.timeout);
        let bytes = fetcher.fetch_url(&url).await?;

        let archive = self.cache_root.join(target.archive_name(major));
        write_file(&archive, &bytes).await?;

        let runtime_dir = dest_base.join(format!("java-{}", major));
        let format = target.archive_format();
        let (archive_path, extract_dir) = (archive.clone(), runtime_dir.clone());
        let written = tokio::task::spawn_blocking(move || match format {
            ArchiveFormat::TarGz => extract_tar_gz(&archive_path, &extract_dir, 1),
            ArchiveFormat::Zip => extract_zip(&archive_path, &extract_dir, 1),
        })
        .await
        .map_err(|e| LauncherError::Worker(e.to_string()))??;

        let java = locate_java_binary(&runtime_dir, target.java_exe());
        if !tokio::fs::try_exists(&java).await.unwrap_or(false) {
            return Err(LauncherError::Extraction {
                archive,
                message: format!("no java executable after extracting into {:?}", runtime_dir),
            });
        }
        ensure_executable(&java)?;

        info!("Java {} ready at {:?} ({} entries)", major, java, written);
        Ok(Some(java))
    }
}

fn locate_java_binary(runtime_root: &Path, java_exe: &str) -> PathBuf {
    let primary = runtime_root.join("bin").join(java_exe);
    if primary.exists() {
        return primary;
    }

    let mac_layout = runtime_root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(java_exe);
    if mac_layout.exists() {
        return mac_layout;
    }

    primary
}

fn ensure_executable(java_bin: &Path) -> LauncherResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(java_bin)
            .map_err(|source| LauncherError::Io {
                path: java_bin.to_path_buf(),
                source,
            })?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(java_bin, perms).map_err(|source| LauncherError::Io {
            path: java_bin.to_path_buf(),
            source,
        })?;
    }
    #[cfg(not(unix))]
    let _ = java_bin;
    Ok(())
}

pub mod platform {
    use super::join_url;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RuntimeOs {
        Linux,
        Mac,
        Windows,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ArchiveFormat {
        TarGz,
        Zip,
    }

    /// OS/arch pair in the runtime API's vocabulary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlatformTarget {
        pub os: RuntimeOs,
        pub arch: &'static str,
    }

    impl PlatformTarget {
        pub fn current() -> Option<Self> {
            Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
        }

        /// `os`/`arch` as in `std::env::consts`. Unknown architectures fall back to x64.
        pub fn from_parts(os: &str, arch: &str) -> Option<Self> {
            let os = match os {
                "linux" => RuntimeOs::Linux,
                "macos" => RuntimeOs::Mac,
                "windows" => RuntimeOs::Windows,
                _ => return None,
            };
            let arch = match arch {
                "aarch64" => "aarch64",
                _ => "x64",
            };
            Some(Self { os, arch })
        }

        pub fn os_name(&self) -> &'static str {
            match self.os {
                RuntimeOs::Linux => "linux",
                RuntimeOs::Mac => "mac",
                RuntimeOs::Windows => "windows",
            }
        }

        pub fn archive_format(&self) -> ArchiveFormat {
            match self.os {
                RuntimeOs::Windows => ArchiveFormat::Zip,
                RuntimeOs::Linux | RuntimeOs::Mac => ArchiveFormat::TarGz,
            }
        }

        pub fn java_exe(&self) -> &'static str {
            match self.os {
                RuntimeOs::Windows => "java.exe",
                RuntimeOs::Linux | RuntimeOs::Mac => "java",
            }
        }

        pub fn endpoint(&self, api_base: &str, major: u32) -> String {
            join_url(
                api_base,
                &format!(
                    "binary/latest/{}/ga/{}/{}/jre/hotspot/normal/eclipse",
                    major,
                    self.os_name(),
                    self.arch
                ),
            )
        }

        pub fn archive_name(&self, major: u32) -> String {
            let ext = match self.archive_format() {
                ArchiveFormat::TarGz => "tar.gz",
                ArchiveFormat::Zip => "zip",
            };
            format!("temurin-jre-{}-{}-{}.{}", major, self.os_name(), self.arch, ext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::platform::{PlatformTarget, RuntimeOs};
    use super::*;
    use crate::core::archive::test_archives::{tar_gz, write_zip};
    use crate::core::downloader::testing::MemoryNetwork;

    const API: &str = "https://api.test/v3";

    fn provisioner(cache: &Path, network: &MemoryNetwork, os: &str, arch: &str) -> RuntimeProvisioner {
        let config = InstallerConfig {
            cache_root: cache.to_path_buf(),
            runtime_api_base: API.to_string(),
            ..InstallerConfig::default()
        };
        RuntimeProvisioner::new(&config)
            .with_transports(Arc::new(network.clone()))
            .with_target(PlatformTarget::from_parts(os, arch))
    }

    #[test]
    fn endpoint_and_archive_names() {
        let linux = PlatformTarget::from_parts("linux", "x86_64").unwrap();
        assert_eq!(
            linux.endpoint("https://api.adoptium.net/v3", 21),
            "https://api.adoptium.net/v3/binary/latest/21/ga/linux/x64/jre/hotspot/normal/eclipse"
        );
        assert_eq!(linux.archive_name(21), "temurin-jre-21-linux-x64.tar.gz");

        let mac = PlatformTarget::from_parts("macos", "aarch64").unwrap();
        assert_eq!(mac.os, RuntimeOs::Mac);
        assert_eq!(mac.archive_name(17), "temurin-jre-17-mac-aarch64.tar.gz");

        let windows = PlatformTarget::from_parts("windows", "x86_64").unwrap();
        assert_eq!(windows.archive_name(8), "temurin-jre-8-windows-x64.zip");
        assert_eq!(windows.java_exe(), "java.exe");

        assert!(PlatformTarget::from_parts("freebsd", "x86_64").is_none());
    }

    #[tokio::test]
    async fn linux_tarball_is_stripped_and_made_executable() {
        let cache = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let network = MemoryNetwork::new();
        network.serve(
            &format!("{}/binary/latest/21/ga/linux/x64/jre/hotspot/normal/eclipse", API),
            tar_gz(&[
                ("jdk-21.0.4+7-jre/bin/java", "#!/bin/sh\n", 0o644),
                ("jdk-21.0.4+7-jre/lib/modules", "modules", 0o644),
            ]),
        );

        let java = provisioner(cache.path(), &network, "linux", "x86_64")
            .provision(21, dest.path())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(java, dest.path().join("java-21").join("bin").join("java"));
        assert!(dest.path().join("java-21/lib/modules").exists());
        assert!(cache.path().join("temurin-jre-21-linux-x64.tar.gz").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&java).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn mac_bundle_layout_is_found() {
        let cache = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let network = MemoryNetwork::new();
        network.serve(
            &format!("{}/binary/latest/17/ga/mac/aarch64/jre/hotspot/normal/eclipse", API),
            tar_gz(&[("jdk-17.0.12+7-jre/Contents/Home/bin/java", "macho", 0o755)]),
        );

        let java = provisioner(cache.path(), &network, "macos", "aarch64")
            .provision(17, dest.path())
            .await
            .unwrap()
            .unwrap();
        assert!(java.ends_with("java-17/Contents/Home/bin/java"));
    }

    #[tokio::test]
    async fn windows_zip_is_stripped() {
        let cache = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let zip_path = staging.path().join("jre.zip");
        write_zip(&zip_path, &[("jdk-21.0.4+7-jre/bin/java.exe", "MZ")]);

        let network = MemoryNetwork::new();
        network.serve(
            &format!("{}/binary/latest/21/ga/windows/x64/jre/hotspot/normal/eclipse", API),
            std::fs::read(&zip_path).unwrap(),
        );

        let java = provisioner(cache.path(), &network, "windows", "x86_64")
            .provision(21, dest.path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(java, dest.path().join("java-21").join("bin").join("java.exe"));
    }

    #[tokio::test]
    async fn unsupported_platform_is_a_no_op() {
        let cache = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let network = MemoryNetwork::new();

        let result = provisioner(cache.path(), &network, "freebsd", "x86_64")
            .provision(21, dest.path())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(network.request_count(), 0);
    }

    #[tokio::test]
    async fn download_failure_is_fatal() {
        let cache = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let network = MemoryNetwork::new();

        let err = provisioner(cache.path(), &network, "linux", "x86_64")
            .provision(21, dest.path())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::AllMirrorsFailed { .. }));
    }

    #[tokio::test]
    async fn corrupt_archive_is_extraction_error() {
        let cache = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let network = MemoryNetwork::new();
        network.serve(
            &format!("{}/binary/latest/21/ga/linux/x64/jre/hotspot/normal/eclipse", API),
            b"not gzip at all".to_vec(),
        );

        let err = provisioner(cache.path(), &network, "linux", "x86_64")
            .provision(21, dest.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Extraction);
    }
}
