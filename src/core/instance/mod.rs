pub mod marker;
pub mod model;

pub use marker::{needs_install, InstallMarker, ModloaderSpec, MARKER_FILE};
pub use model::{InstanceLayout, LoaderType};
