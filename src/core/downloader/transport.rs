use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

/// A single-request GET capability.
///
/// Implementations are not required to be shareable across concurrent
/// downloads; the asset stage asks its [`TransportFactory`] for one transport
/// per worker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` in full. Any non-2xx status is an error.
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        headers: &[(&str, &str)],
    ) -> LauncherResult<Vec<u8>>;
}

/// Hands out independent transports, one per worker.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> LauncherResult<Box<dyn Transport>>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        headers: &[(&str, &str)],
    ) -> LauncherResult<Vec<u8>> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransportFactory;

impl TransportFactory for HttpTransportFactory {
    fn create(&self) -> LauncherResult<Box<dyn Transport>> {
        Ok(Box::new(HttpTransport::new()?))
    }
}
