//! Dynamic proxy generator: client stubs derived from service descriptors by the same conventions as the server.

mod client;
mod transport;

pub use client::{ProxyArgs, ProxyClient, ProxyMethod, ServiceProxy, API_DEFINITION_PATH};
pub use transport::{HttpTransport, RouterTransport, Transport, TransportRequest, TransportResponse};
