//! Chain node connections
//!
//! This module provides the connection endpoint for chain nodes:
//! - [`Endpoint`] establishes a live link from a [`ChainSpec`]
//! - [`ChainConnection`] is the handle for queries and submission
//! - [`ws`] implements both over WebSocket JSON-RPC
//!
//! Exactly one connection is live per session; the session container
//! owns the handle and closes it before publishing a replacement.

pub mod codec;
pub mod ws;

pub use ws::{WsConnection, WsEndpoint};

use std::sync::Arc;

use async_trait::async_trait;

use crate::chains::ChainSpec;
use crate::error::SessionError;
use crate::extension::Signer;
use crate::types::ChainProperties;

/// A live link to a chain node
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// Token metadata of the chain behind this connection
    async fn properties(&self) -> Result<ChainProperties, SessionError>;

    /// Raw available balance of an account, in the smallest denomination
    async fn available_balance(&self, address: &str) -> Result<u128, SessionError>;

    /// Whether the chain exposes the balance-transfer call
    fn supports_transfer(&self) -> bool;

    /// Sign and submit a value transfer, returning the transaction hash
    /// once the node acknowledges receipt (not finality)
    async fn submit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u128,
        signer: Arc<dyn Signer>,
    ) -> Result<String, SessionError>;

    /// Release the link; idempotent, safe on an already-closed connection
    async fn close(&self);
}

/// Factory for chain connections
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Establish a network link to `spec.endpoint`
    ///
    /// May suspend for a network round trip plus handshake. No retries
    /// happen here; retry policy belongs to the caller.
    async fn open(&self, spec: &ChainSpec) -> Result<Arc<dyn ChainConnection>, SessionError>;
}
