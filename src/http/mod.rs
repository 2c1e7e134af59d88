//! HTTP layer: client identity, retry policy and the transport seam

pub mod client;
pub mod identity;
pub mod retry;

pub use client::{
    ByteStream, HttpClient, ReqwestTransport, StreamResponse, Transport, TransportError,
};
pub use identity::ClientConfig;
pub use retry::{RetryFailure, RetryPolicy};
