use std::time::Duration;

use tracing::debug;

use super::transport::Transport;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::IDENTITY_ENCODING;

/// Attempts per mirror before moving on to the next one.
pub const ATTEMPTS_PER_MIRROR: usize = 2;

/// GETs an artifact from an ordered list of mirrors.
///
/// Owns its transport: a fetcher is never shared between concurrently
/// running downloads.
pub struct ContentFetcher {
    transport: Box<dyn Transport>,
    timeout: Duration,
}

impl ContentFetcher {
    pub fn new(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Fetch `relative` from each of `mirrors` in order.
    ///
    /// With `relative == None` every mirror entry is a complete URL.
    /// Each mirror gets [`ATTEMPTS_PER_MIRROR`] tries, no backoff. When all of
    /// them fail the individual causes are logged and a single
    /// [`LauncherError::AllMirrorsFailed`] is returned.
    pub async fn fetch(&self, mirrors: &[String], relative: Option<&str>) -> LauncherResult<Vec<u8>> {
        let relative = relative.filter(|rel| !rel.is_empty());

        for mirror in mirrors {
            let url = match relative {
                Some(rel) => join_url(mirror, rel),
                None => mirror.clone(),
            };

            for attempt in 1..=ATTEMPTS_PER_MIRROR {
                match self.transport.get(&url, self.timeout, IDENTITY_ENCODING).await {
                    Ok(bytes) => {
                        debug!("Fetched {} ({} bytes)", url, bytes.len());
                        return Ok(bytes);
                    }
                    Err(e) => {
                        debug!("GET {} failed (attempt {}): {}", url, attempt, e);
                    }
                }
            }
        }

        Err(LauncherError::AllMirrorsFailed {
            target: relative
                .map(str::to_string)
                .or_else(|| mirrors.first().cloned())
                .unwrap_or_default(),
        })
    }

    /// Convenience for a single exact URL.
    pub async fn fetch_url(&self, url: &str) -> LauncherResult<Vec<u8>> {
        self.fetch(&[url.to_string()], None).await
    }
}

/// `base` + `/` + `relative`, without doubling the separator.
pub fn join_url(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}
