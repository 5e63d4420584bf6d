use std::collections::BTreeSet;

use crate::core::cache::{is_sha1_hex, object_relative_path};
use crate::core::error::{LauncherError, LauncherResult};

/// A parsed asset index (`{"objects": {"<name>": {"hash": "...", "size": n}}}`).
///
/// Kept as loose JSON so one malformed object entry does not reject the whole
/// index; such entries are dropped by [`AssetIndex::entries`].
#[derive(Debug, Clone)]
pub struct AssetIndex {
    raw: serde_json::Value,
}

/// One content-addressed asset object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssetEntry {
    /// Lowercase SHA-1, also the content key.
    pub hash: String,
    /// `<hash[0:2]>/<hash>`
    pub relative_path: String,
}

impl AssetIndex {
    /// Parse index bytes. Anything but a JSON object is rejected.
    pub fn parse(bytes: &[u8]) -> LauncherResult<Self> {
        let raw: serde_json::Value = serde_json::from_slice(bytes)?;
        if !raw.is_object() {
            return Err(LauncherError::Descriptor(
                "asset index is not a JSON object".into(),
            ));
        }
        Ok(Self { raw })
    }

    pub fn object_count(&self) -> usize {
        self.raw
            .get("objects")
            .and_then(|o| o.as_object())
            .map(|o| o.len())
            .unwrap_or(0)
    }

    /// Distinct well-formed objects, ordered by hash. Entries whose hash is not
    /// exactly 40 hex characters are discarded.
    pub fn entries(&self) -> Vec<AssetEntry> {
        let Some(objects) = self.raw.get("objects").and_then(|o| o.as_object()) else {
            return Vec::new();
        };

        let hashes: BTreeSet<String> = objects
            .values()
            .filter_map(|obj| obj.get("hash").and_then(|h| h.as_str()))
            .filter(|hash| is_sha1_hex(hash))
            .map(|hash| hash.to_ascii_lowercase())
            .collect();

        hashes
            .into_iter()
            .map(|hash| AssetEntry {
                relative_path: object_relative_path(&hash),
                hash,
            })
            .collect()
    }

    /// Compact serialization used when persisting a copy.
    pub fn to_bytes(&self) -> LauncherResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.raw)?)
    }
}
