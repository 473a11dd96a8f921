//! substrate-session - Wallet/chain session manager
//!
//! Bridges a browser-injected wallet extension and a remote chain-node
//! endpoint behind one reactive session object. UI layers of any
//! framework observe [`SessionState`] snapshots through a watch
//! subscription and drive the session with two imperative operations,
//! [`Session::connect`] and [`Session::transfer`].
//!
//! The wallet extension and the chain node are external collaborators:
//! the extension is abstracted by the [`extension::WalletExtension`]
//! trait, the node by [`node::Endpoint`], with a WebSocket JSON-RPC
//! implementation in [`node::ws`].

pub mod address;
pub mod balance;
pub mod chains;
pub mod error;
pub mod extension;
pub mod node;
pub mod session;
pub mod transfer;
pub mod types;

// Re-export the consumer-facing surface
pub use balance::format_balance;
pub use chains::{ChainRegistry, ChainSpec};
pub use error::SessionError;
pub use extension::{AccountStream, Signer, WalletExtension};
pub use node::{ChainConnection, Endpoint, WsConnection, WsEndpoint};
pub use session::Session;
pub use transfer::parse_amount;
pub use types::{Account, AccountMeta, ChainProperties, SessionState, SessionStatus};
