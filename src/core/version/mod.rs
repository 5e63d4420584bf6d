pub mod descriptor;
pub mod manifest;
pub mod version_file;

pub use descriptor::{AssetIndexRef, ClientArchiveRef, LibraryEntry, VersionDescriptor};
pub use manifest::{ManifestResolver, MojangResolver, VersionEntry, VersionManifest};
pub use version_file::VersionJson;
