//! Wallet Bridge
//!
//! Interface to the browser-injected wallet extension: enabling it for
//! this application, enumerating authorized accounts, and resolving a
//! signer capability for a chosen account. The extension itself lives
//! outside this crate; consumers supply an implementation of
//! [`WalletExtension`] that bridges to whatever injection mechanism
//! their host environment provides.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::SessionError;
use crate::types::Account;

/// Live account-set updates pushed by the extension
pub type AccountStream = Pin<Box<dyn Stream<Item = Vec<Account>> + Send>>;

/// A capability to perform one signing operation
///
/// Obtained from the wallet extension for a specific account source.
/// The returned bytes are a complete multi-signature (scheme byte plus
/// signature), produced without this crate ever seeing key material.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign the payload, returning the signature bytes
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SessionError>;
}

/// The wallet extension protocol
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Request the extension grant this application access
    ///
    /// Idempotent across repeated calls within a session. Fails with
    /// [`SessionError::ExtensionUnavailable`] when no compatible
    /// extension is injected, or [`SessionError::AuthorizationDenied`]
    /// when the user declines.
    async fn enable(&self, app_name: &str) -> Result<(), SessionError>;

    /// Enumerate all accounts authorized for this application
    ///
    /// May be empty. `enable` must have succeeded first.
    async fn accounts(&self) -> Result<Vec<Account>, SessionError>;

    /// Subscribe to account-set changes
    ///
    /// Extensions that support live updates yield a fresh full set
    /// whenever the user adds or removes an account. The default
    /// implementation never yields, for extensions without support.
    async fn subscribe_accounts(&self) -> Result<AccountStream, SessionError> {
        Ok(Box::pin(futures_util::stream::pending()))
    }

    /// Resolve a signer capability for an account's source tag
    ///
    /// Fails with [`SessionError::SignerResolution`] if the source is
    /// no longer available (e.g. the extension was disabled mid-session).
    async fn signer(&self, source: &str) -> Result<Arc<dyn Signer>, SessionError>;
}
