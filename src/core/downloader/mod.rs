pub mod fetcher;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{join_url, ContentFetcher};
pub use transport::{HttpTransport, HttpTransportFactory, Transport, TransportFactory};
