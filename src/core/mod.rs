// ─── Tesuto Install Core ───
// Version installation backend: everything between "resolve a version id" and
// "the instance directory is ready to launch".
//
// Architecture:
//   core/
//     version/    - Mojang manifest + version JSON + OS rules → descriptor
//     maven/      - Coordinate parser (coordinate → repository path)
//     downloader/ - Transports + ordered-mirror fetcher
//     cache/      - Shared content store, SHA-1 checks, placement
//     assets/     - Asset index
//     instance/   - Instance layout + install marker
//     install/    - Pipeline: assets, libraries + natives, client archive
//     java/       - Temurin runtime provisioning

pub mod archive;
pub mod assets;
pub mod cache;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod instance;
pub mod java;
pub mod maven;
pub mod version;
