// In-memory network for tests: serves fixed bodies and records every GET.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::transport::{Transport, TransportFactory};
use crate::core::error::{LauncherError, LauncherResult};

#[derive(Default)]
struct NetworkState {
    routes: HashMap<String, Vec<u8>>,
    failures: HashMap<String, usize>,
    requests: Vec<String>,
    transports_created: usize,
}

#[derive(Clone, Default)]
pub struct MemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: Vec<u8>) {
        self.state.lock().unwrap().routes.insert(url.to_string(), body);
    }

    pub fn remove(&self, url: &str) {
        self.state.lock().unwrap().routes.remove(url);
    }

    /// Make the next `times` requests for `url` fail with a 503.
    pub fn fail_next(&self, url: &str, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(url.to_string(), times);
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    pub fn transports_created(&self) -> usize {
        self.state.lock().unwrap().transports_created
    }
}

impl TransportFactory for MemoryNetwork {
    fn create(&self) -> LauncherResult<Box<dyn Transport>> {
        self.state.lock().unwrap().transports_created += 1;
        Ok(Box::new(MemoryTransport {
            network: self.clone(),
        }))
    }
}

struct MemoryTransport {
    network: MemoryNetwork,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(
        &self,
        url: &str,
        _timeout: Duration,
        _headers: &[(&str, &str)],
    ) -> LauncherResult<Vec<u8>> {
        let mut state = self.network.state.lock().unwrap();
        state.requests.push(url.to_string());

        if let Some(remaining) = state.failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(LauncherError::DownloadFailed {
                    url: url.to_string(),
                    status: 503,
                });
            }
        }

        state
            .routes
            .get(url)
            .cloned()
            .ok_or_else(|| LauncherError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            })
    }
}
