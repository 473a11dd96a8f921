//! Session Error Types
//!
//! Unified error handling for the wallet/chain session manager.

use thiserror::Error;

/// Errors surfaced by session operations.
///
/// Every variant is recoverable by retrying the corresponding operation;
/// none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Chain identifier is not present in the registry
    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    /// No compatible wallet extension is present
    #[error("Wallet extension unavailable: {0}")]
    ExtensionUnavailable(String),

    /// The user declined to authorize the application
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Network or handshake failure while talking to the chain node
    #[error("Connection error: {0}")]
    Connection(String),

    /// The wallet source backing an account is no longer available
    #[error("Signer resolution failed: {0}")]
    SignerResolution(String),

    /// Account is not part of the currently authorized set
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Transfer amount did not parse as a non-negative number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The active chain does not expose the required capability
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Signing was refused or failed inside the wallet extension
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The node rejected the submitted transaction
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The node returned a JSON-RPC error object
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Response parsing failed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for SessionError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SessionError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Parse(err.to_string())
    }
}
