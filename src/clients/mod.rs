//! HTTP clients for the external collaborators probes talk to.
//!
//! Three thin clients: the gateway under test, the local IPFS node's HTTP
//! RPC API, and an optional IPFS pinning service. All of them share one
//! error type and judge nothing about content; probes decide what a
//! response means.

mod gateway;
mod ipfs;
mod pinning;

pub use gateway::{FetchOutcome, GatewayClient};
pub use ipfs::{IpfsClient, KeyInfo};
pub use pinning::{PinState, PinStatus, PinningClient};

use thiserror::Error;

/// Errors from talking to an external service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} returned status {status} for {endpoint}")]
    Status {
        service: &'static str,
        endpoint: String,
        status: u16,
    },
}
