//! Chain Registry
//!
//! Static mapping from a chain identifier to its connection parameters.
//! Pure lookups, no I/O.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Connection parameters for one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    /// Registry key
    pub id: String,
    /// WebSocket RPC endpoint
    pub endpoint: String,
    /// SS58 address-format prefix
    pub prefix: u16,
    /// Display asset reference
    pub logo: String,
}

impl ChainSpec {
    pub fn new(id: &str, endpoint: &str, prefix: u16, logo: &str) -> Self {
        Self {
            id: id.to_string(),
            endpoint: endpoint.to_string(),
            prefix,
            logo: logo.to_string(),
        }
    }
}

/// Registry of known chains, fixed at construction
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<String, ChainSpec>,
}

impl ChainRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in chain entries
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ChainSpec::new(
            "default",
            "wss://1rpc.io/dot",
            0,
            "assets/substrate/polkadot.svg",
        ));
        registry.register(ChainSpec::new(
            "polkadot",
            "wss://1rpc.io/dot",
            0,
            "assets/substrate/polkadot.svg",
        ));
        registry.register(ChainSpec::new(
            "kusama",
            "wss://1rpc.io/ksm",
            2,
            "assets/substrate/kusama.svg",
        ));
        registry.register(ChainSpec::new(
            "astar",
            "wss://1rpc.io/astr",
            5,
            "assets/substrate/astar.svg",
        ));
        registry
    }

    /// Add or replace an entry
    pub fn register(&mut self, spec: ChainSpec) {
        self.chains.insert(spec.id.clone(), spec);
    }

    /// Look up a chain by identifier
    pub fn lookup(&self, chain_id: &str) -> Result<&ChainSpec, SessionError> {
        self.chains
            .get(chain_id)
            .ok_or_else(|| SessionError::UnknownChain(chain_id.to_string()))
    }

    /// Identifiers of all registered chains
    pub fn chain_ids(&self) -> Vec<&str> {
        self.chains.keys().map(|k| k.as_str()).collect()
    }
}
