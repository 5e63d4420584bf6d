pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::InstallerConfig;
pub use crate::core::error::{ErrorKind, LauncherError, LauncherResult};
pub use crate::core::install::{InstallReport, Installer};
pub use crate::core::java::RuntimeProvisioner;

/// Structured logging for the binary. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tesuto_install=debug")),
        )
        .init();
}
