pub mod runtime;

pub use runtime::platform::{ArchiveFormat, PlatformTarget, RuntimeOs};
pub use runtime::RuntimeProvisioner;
