//! WebSocket JSON-RPC connection
//!
//! Connection management for chain nodes: a spawned reader/writer task
//! owns the socket, callers correlate requests and responses through a
//! pending-request map keyed by JSON-RPC id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::address;
use crate::chains::ChainSpec;
use crate::error::SessionError;
use crate::extension::Signer;
use crate::node::{codec, ChainConnection, Endpoint};
use crate::types::ChainProperties;

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Payloads above this size are hashed before signing
const SIGNING_PAYLOAD_LIMIT: usize = 256;

/// Extrinsic format version 4, signed bit set
const EXTRINSIC_VERSION_SIGNED: u8 = 0x84;

type Reply = oneshot::Sender<Result<Value, SessionError>>;

enum WsCommand {
    Call {
        id: u64,
        method: String,
        params: Value,
        reply: Reply,
    },
    Shutdown,
}

/// A live JSON-RPC connection to one chain node
pub struct WsConnection {
    cmd_tx: mpsc::Sender<WsCommand>,
    next_id: AtomicU64,
    properties: ChainProperties,
}

impl WsConnection {
    /// Connect to the node and complete the properties handshake
    pub async fn open(spec: &ChainSpec) -> Result<Self, SessionError> {
        info!("Connecting to {} at {}", spec.id, spec.endpoint);
        let (ws_stream, _response) = connect_async(&spec.endpoint)
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        info!("WebSocket connected to {}", spec.endpoint);

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(100);

        tokio::spawn(async move {
            let (mut write, mut read) = ws_stream.split();
            let mut pending: HashMap<u64, Reply> = HashMap::new();
            let mut ping = tokio::time::interval(PING_INTERVAL);
            ping.tick().await; // first tick is immediate

            loop {
                tokio::select! {
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        WsCommand::Call { id, method, params, reply } => {
                            let frame = json!({
                                "jsonrpc": "2.0",
                                "id": id,
                                "method": method,
                                "params": params,
                            })
                            .to_string();
                            debug!("Sending RPC request: {}", &frame[..frame.len().min(120)]);
                            if write.send(Message::Text(frame)).await.is_err() {
                                error!("Failed to send RPC request");
                                let _ = reply.send(Err(SessionError::Connection(
                                    "send failed".to_string(),
                                )));
                                break;
                            }
                            pending.insert(id, reply);
                        }
                        WsCommand::Shutdown => {
                            info!("Closing node connection");
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                    },

                    Some(result) = read.next() => match result {
                        Ok(Message::Text(text)) => {
                            debug!("Received RPC response: {}", &text[..text.len().min(120)]);
                            dispatch_response(&mut pending, &text);
                        }
                        Ok(Message::Ping(data)) => {
                            if write.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Message::Pong(_)) => {
                            // Connection is alive
                        }
                        Ok(Message::Close(_)) => {
                            info!("Node closed the connection");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("WebSocket error: {}", e);
                            break;
                        }
                    },

                    _ = ping.tick() => {
                        if write.send(Message::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }

                    else => break,
                }
            }

            for (_, reply) in pending.drain() {
                let _ = reply.send(Err(SessionError::Connection(
                    "connection closed".to_string(),
                )));
            }
        });

        let mut conn = Self {
            cmd_tx,
            next_id: AtomicU64::new(1),
            properties: ChainProperties::default(),
        };
        let raw = conn.rpc("system_properties", json!([])).await?;
        conn.properties = parse_properties(&raw);
        info!(
            "Chain properties: {} decimals, symbol {}",
            conn.properties.decimals, conn.properties.symbol
        );
        Ok(conn)
    }

    /// Single JSON-RPC round trip
    async fn rpc(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(WsCommand::Call {
                id,
                method: method.to_string(),
                params,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::Connection("connection closed".to_string()))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Connection("connection closed".to_string()))?
    }
}

#[async_trait]
impl ChainConnection for WsConnection {
    async fn properties(&self) -> Result<ChainProperties, SessionError> {
        Ok(self.properties.clone())
    }

    async fn available_balance(&self, addr: &str) -> Result<u128, SessionError> {
        let (public, _) = address::decode(addr)
            .ok_or_else(|| SessionError::Parse(format!("not a valid SS58 address: {}", addr)))?;
        let key = format!("0x{}", hex::encode(codec::system_account_key(&public)));

        match self.rpc("state_getStorage", json!([key])).await? {
            Value::Null => Ok(0), // account has no storage entry yet
            Value::String(encoded) => {
                let bytes = hex::decode(encoded.trim_start_matches("0x"))
                    .map_err(|e| SessionError::Parse(e.to_string()))?;
                codec::decode_account_free(&bytes)
            }
            other => Err(SessionError::Parse(format!(
                "unexpected storage response: {}",
                other
            ))),
        }
    }

    fn supports_transfer(&self) -> bool {
        // Implied by a completed handshake; no metadata probing here
        true
    }

    async fn submit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u128,
        signer: Arc<dyn Signer>,
    ) -> Result<String, SessionError> {
        let (from_public, _) = address::decode(from)
            .ok_or_else(|| SessionError::Parse(format!("not a valid SS58 address: {}", from)))?;
        let (to_public, _) = address::decode(to)
            .ok_or_else(|| SessionError::Parse(format!("not a valid SS58 address: {}", to)))?;

        let call = codec::transfer_keep_alive_call(&to_public, amount);

        let nonce = self
            .rpc("system_accountNextIndex", json!([from]))
            .await?
            .as_u64()
            .ok_or_else(|| SessionError::Parse("nonce is not a number".to_string()))?;

        let runtime = self.rpc("state_getRuntimeVersion", json!([])).await?;
        let spec_version = version_field(&runtime, "specVersion")?;
        let tx_version = version_field(&runtime, "transactionVersion")?;

        let genesis = self.rpc("chain_getBlockHash", json!([0])).await?;
        let genesis = genesis
            .as_str()
            .ok_or_else(|| SessionError::Parse("genesis hash is not a string".to_string()))?;
        let genesis = hex::decode(genesis.trim_start_matches("0x"))
            .map_err(|e| SessionError::Parse(e.to_string()))?;

        // Signing payload: call ++ extra ++ additional, immortal era
        // checkpointed at genesis
        let mut payload = call.clone();
        payload.push(codec::ERA_IMMORTAL);
        payload.extend_from_slice(&codec::compact(nonce as u128));
        payload.extend_from_slice(&codec::compact(0)); // tip
        payload.extend_from_slice(&spec_version.to_le_bytes());
        payload.extend_from_slice(&tx_version.to_le_bytes());
        payload.extend_from_slice(&genesis);
        payload.extend_from_slice(&genesis);

        let signature = if payload.len() > SIGNING_PAYLOAD_LIMIT {
            signer.sign(&codec::blake2_256(&payload)).await?
        } else {
            signer.sign(&payload).await?
        };

        let mut body = vec![EXTRINSIC_VERSION_SIGNED];
        body.push(0x00); // MultiAddress::Id
        body.extend_from_slice(&from_public);
        body.extend_from_slice(&signature);
        body.push(codec::ERA_IMMORTAL);
        body.extend_from_slice(&codec::compact(nonce as u128));
        body.extend_from_slice(&codec::compact(0));
        body.extend_from_slice(&call);

        let mut extrinsic = codec::compact(body.len() as u128);
        extrinsic.extend_from_slice(&body);

        let submitted = format!("0x{}", hex::encode(extrinsic));
        let hash = self
            .rpc("author_submitExtrinsic", json!([submitted]))
            .await
            .map_err(|e| SessionError::Submission(e.to_string()))?;
        hash.as_str()
            .map(|h| h.to_string())
            .ok_or_else(|| SessionError::Parse("transaction hash is not a string".to_string()))
    }

    async fn close(&self) {
        // Send failure means the task already exited; close stays a no-op
        let _ = self.cmd_tx.send(WsCommand::Shutdown).await;
    }
}

/// Opens [`WsConnection`]s for the session container
#[derive(Debug, Clone, Default)]
pub struct WsEndpoint;

#[async_trait]
impl Endpoint for WsEndpoint {
    async fn open(&self, spec: &ChainSpec) -> Result<Arc<dyn ChainConnection>, SessionError> {
        let conn = WsConnection::open(spec).await?;
        Ok(Arc::new(conn))
    }
}

/// Route a response frame to its pending caller
fn dispatch_response(pending: &mut HashMap<u64, Reply>, text: &str) {
    let frame: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Discarding unparseable frame: {}", e);
            return;
        }
    };

    let Some(id) = frame.get("id").and_then(|v| v.as_u64()) else {
        debug!("Ignoring frame without request id");
        return;
    };

    let Some(reply) = pending.remove(&id) else {
        warn!("Response for unknown request id {}", id);
        return;
    };

    let result = if let Some(err) = frame.get("error") {
        Err(SessionError::Rpc(err.to_string()))
    } else {
        Ok(frame.get("result").cloned().unwrap_or(Value::Null))
    };
    let _ = reply.send(result);
}

/// Token metadata out of a `system_properties` response
///
/// Nodes report `tokenDecimals`/`tokenSymbol` either as scalars or as
/// per-asset arrays; the first entry wins, defaults cover the rest.
fn parse_properties(raw: &Value) -> ChainProperties {
    let defaults = ChainProperties::default();
    let decimals = first_number(raw.get("tokenDecimals")).unwrap_or(defaults.decimals);
    let symbol = first_string(raw.get("tokenSymbol")).unwrap_or(defaults.symbol);
    ChainProperties { decimals, symbol }
}

fn first_number(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().map(|v| v as u32),
        Value::Array(items) => items.first().and_then(|v| v.as_u64()).map(|v| v as u32),
        _ => None,
    }
}

fn first_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items
            .first()
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}

fn version_field(runtime: &Value, field: &str) -> Result<u32, SessionError> {
    runtime
        .get(field)
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
        .ok_or_else(|| SessionError::Parse(format!("runtime version missing {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties_arrays() {
        let raw = json!({
            "tokenDecimals": [10],
            "tokenSymbol": ["DOT"],
            "ss58Format": 0,
        });
        let props = parse_properties(&raw);
        assert_eq!(props.decimals, 10);
        assert_eq!(props.symbol, "DOT");
    }

    #[test]
    fn test_parse_properties_scalars() {
        let raw = json!({ "tokenDecimals": 18, "tokenSymbol": "ASTR" });
        let props = parse_properties(&raw);
        assert_eq!(props.decimals, 18);
        assert_eq!(props.symbol, "ASTR");
    }

    #[test]
    fn test_parse_properties_empty_falls_back() {
        let props = parse_properties(&json!({}));
        assert_eq!(props.decimals, 12);
        assert_eq!(props.symbol, "UNIT");
    }

    #[test]
    fn test_dispatch_response_success_and_error() {
        let mut pending = HashMap::new();

        let (tx, mut rx) = oneshot::channel();
        pending.insert(1, tx);
        dispatch_response(&mut pending, r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#);
        assert_eq!(rx.try_recv().unwrap().unwrap(), json!("0xabc"));

        let (tx, mut rx) = oneshot::channel();
        pending.insert(2, tx);
        dispatch_response(
            &mut pending,
            r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"no method"}}"#,
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(SessionError::Rpc(msg)) if msg.contains("no method")
        ));
    }

    #[test]
    fn test_dispatch_ignores_unknown_id() {
        let mut pending: HashMap<u64, Reply> = HashMap::new();
        dispatch_response(&mut pending, r#"{"jsonrpc":"2.0","id":9,"result":null}"#);
        assert!(pending.is_empty());
    }
}
