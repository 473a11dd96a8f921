//! Common types for the wallet/chain session
//!
//! These types form the observable session aggregate shared by all
//! UI layers, independent of any particular reactivity framework.

use serde::{Deserialize, Serialize};

/// Metadata attached to an injected account by the wallet extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    /// Display name, if the user assigned one
    pub name: Option<String>,
    /// Identifier of the extension instance vouching for this account
    pub source: String,
}

/// An account authorized by the wallet extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// SS58-encoded address
    pub address: String,
    pub meta: AccountMeta,
}

impl Account {
    pub fn new(address: &str, name: Option<&str>, source: &str) -> Self {
        Self {
            address: address.to_string(),
            meta: AccountMeta {
                name: name.map(|n| n.to_string()),
                source: source.to_string(),
            },
        }
    }
}

/// Token metadata reported by the chain node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    /// Decimal places of the native token
    pub decimals: u32,
    /// Display symbol of the native token
    pub symbol: String,
}

impl Default for ChainProperties {
    fn default() -> Self {
        // Nodes that report no properties fall back to the generic unit,
        // matching what polkadot.js does for development chains.
        Self {
            decimals: 12,
            symbol: "UNIT".to_string(),
        }
    }
}

/// Lifecycle of the session as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No connection attempt has been made, or the session was torn down
    Disconnected,
    /// Waiting for the wallet extension to grant access
    Authorizing,
    /// Establishing the node connection
    Connecting,
    /// Connected and authorized; accounts and balance are live
    Ready,
    /// The last connect attempt failed; cleared by the next attempt
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Disconnected => write!(f, "disconnected"),
            SessionStatus::Authorizing => write!(f, "authorizing"),
            SessionStatus::Connecting => write!(f, "connecting"),
            SessionStatus::Ready => write!(f, "ready"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The observable session snapshot
///
/// Published as a unit on every mutation: an observer never sees a
/// partially updated combination of fields. The live connection handle
/// itself stays inside the session container; `connection_seq` is the
/// generation counter observers can use to correlate snapshots with a
/// particular connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Identifier of the active chain, if any
    pub chain_id: Option<String>,
    /// Accounts authorized by the wallet extension
    pub accounts: Vec<Account>,
    /// The selected account; always an element of `accounts` when set
    pub selected: Option<Account>,
    /// Formatted balance of the selected account, empty when unknown
    pub balance: String,
    /// Bumped every time a new connection is published
    pub connection_seq: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            chain_id: None,
            accounts: Vec::new(),
            selected: None,
            balance: String::new(),
            connection_seq: 0,
        }
    }
}

impl SessionState {
    /// Whether the session is connected and authorized
    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Ready
    }

    /// Address of the selected account, if any
    pub fn selected_address(&self) -> Option<&str> {
        self.selected.as_ref().map(|a| a.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_disconnected() {
        let state = SessionState::default();
        assert_eq!(state.status, SessionStatus::Disconnected);
        assert!(state.accounts.is_empty());
        assert!(state.selected.is_none());
        assert_eq!(state.balance, "");
        assert!(!state.is_connected());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Ready.to_string(), "ready");
        assert_eq!(SessionStatus::Disconnected.to_string(), "disconnected");
    }
}
