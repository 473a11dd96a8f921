//! Session State Container
//!
//! The single writer of [`SessionState`]. All mutations funnel through
//! the operations here and are published as whole snapshots over a
//! watch channel, so observers never see a torn combination of fields.
//!
//! `connect` and `select_account` share one async mutex: racing
//! `connect()` calls serialize instead of overwriting each other, and an
//! account switch can never interleave with a connect that has not yet
//! published its account set.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::address;
use crate::balance::{self, RefreshRequest};
use crate::chains::ChainRegistry;
use crate::error::SessionError;
use crate::extension::WalletExtension;
use crate::node::{ChainConnection, Endpoint};
use crate::transfer;
use crate::types::{Account, ChainProperties, SessionState, SessionStatus};

struct Inner {
    /// The one live connection; owned here, never published
    connection: Option<Arc<dyn ChainConnection>>,
    properties: ChainProperties,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    accounts_task: Option<tokio::task::JoinHandle<()>>,
}

impl Inner {
    fn publish(&mut self) {
        let _ = self.state_tx.send(self.state.clone());
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.state.status = status;
        self.publish();
    }
}

/// State shared with the balance synchronizer task
pub(crate) struct Shared {
    inner: Mutex<Inner>,
}

impl Shared {
    /// Publish a refreshed balance if its generation and account are
    /// still current; returns false for a stale result
    pub(crate) async fn apply_balance(&self, seq: u64, addr: &str, formatted: String) -> bool {
        let mut inner = self.inner.lock().await;
        let current =
            inner.state.connection_seq == seq && inner.state.selected_address() == Some(addr);
        if current {
            inner.state.balance = formatted;
            inner.publish();
        }
        current
    }
}

/// The wallet/chain session
///
/// One explicitly constructed instance per application; clones share
/// the same underlying session. Create inside a tokio runtime — the
/// balance synchronizer runs as a spawned task.
#[derive(Clone)]
pub struct Session {
    registry: Arc<ChainRegistry>,
    extension: Arc<dyn WalletExtension>,
    endpoint: Arc<dyn Endpoint>,
    shared: Arc<Shared>,
    state_rx: watch::Receiver<SessionState>,
    refresh_tx: mpsc::UnboundedSender<RefreshRequest>,
}

impl Session {
    pub fn new(
        registry: ChainRegistry,
        extension: Arc<dyn WalletExtension>,
        endpoint: Arc<dyn Endpoint>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                connection: None,
                properties: ChainProperties::default(),
                state: SessionState::default(),
                state_tx,
                accounts_task: None,
            }),
        });

        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        tokio::spawn(balance::run(refresh_rx, shared.clone()));

        Self {
            registry: Arc::new(registry),
            extension,
            endpoint,
            shared,
            state_rx,
            refresh_tx,
        }
    }

    /// Read-only subscription to session snapshots
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Current snapshot
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Authorize the wallet extension, enumerate accounts, and connect
    /// to the chain; returns the selected account's address
    ///
    /// On failure the previously published data fields are retained and
    /// the status moves to [`SessionStatus::Failed`]; the next call
    /// starts the machine over.
    pub async fn connect(&self, app_name: &str, chain_id: &str) -> Result<String, SessionError> {
        let spec = self.registry.lookup(chain_id)?.clone();

        let mut inner = self.shared.inner.lock().await;
        info!("Connecting to {} as {}", chain_id, app_name);
        inner.set_status(SessionStatus::Authorizing);

        if let Err(e) = self.extension.enable(app_name).await {
            warn!("Wallet authorization failed: {}", e);
            inner.set_status(SessionStatus::Failed);
            return Err(e);
        }

        let accounts = match self.extension.accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("Account enumeration failed: {}", e);
                inner.set_status(SessionStatus::Failed);
                return Err(e);
            }
        };
        if accounts.is_empty() {
            warn!("Extension returned no authorized accounts");
            inner.set_status(SessionStatus::Failed);
            return Err(SessionError::AuthorizationDenied(
                "no accounts authorized for this application".to_string(),
            ));
        }

        inner.set_status(SessionStatus::Connecting);
        let connection = match self.endpoint.open(&spec).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Node connection failed: {}", e);
                inner.set_status(SessionStatus::Failed);
                return Err(e);
            }
        };
        let properties = match connection.properties().await {
            Ok(properties) => properties,
            Err(e) => {
                warn!("Chain properties query failed: {}", e);
                connection.close().await;
                inner.set_status(SessionStatus::Failed);
                return Err(e);
            }
        };

        // The old link goes away before the new one becomes observable
        if let Some(old) = inner.connection.take() {
            old.close().await;
        }

        let selected = accounts[0].clone();
        let seq = inner.state.connection_seq + 1;
        inner.connection = Some(connection);
        inner.properties = properties;
        inner.state = SessionState {
            status: SessionStatus::Ready,
            chain_id: Some(spec.id.clone()),
            accounts,
            selected: Some(selected.clone()),
            balance: String::new(),
            connection_seq: seq,
        };
        inner.publish();
        info!(
            "Session ready on {} with {} account(s)",
            spec.id,
            inner.state.accounts.len()
        );

        self.queue_refresh(&inner, seq, &selected.address);
        self.spawn_accounts_listener(&mut inner).await;

        Ok(selected.address)
    }

    /// Switch the selected account
    ///
    /// Fails with [`SessionError::InvalidAccount`] when the account is
    /// not part of the current authorized set; the selection is then
    /// left unchanged.
    pub async fn select_account(&self, account: &Account) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;

        let Some(chosen) = inner
            .state
            .accounts
            .iter()
            .find(|a| a.address == account.address)
            .cloned()
        else {
            return Err(SessionError::InvalidAccount(account.address.clone()));
        };

        if inner.state.selected_address() == Some(chosen.address.as_str()) {
            return Ok(());
        }

        debug!("Selecting account {}", chosen.address);
        inner.state.selected = Some(chosen.clone());
        inner.state.balance = String::new();
        inner.publish();

        let seq = inner.state.connection_seq;
        self.queue_refresh(&inner, seq, &chosen.address);
        Ok(())
    }

    /// Transfer from the selected account
    pub async fn transfer(&self, to: &str, amount: &str) -> Result<String, SessionError> {
        let (connection, from) = {
            let inner = self.shared.inner.lock().await;
            let from = inner.state.selected.clone().ok_or_else(|| {
                SessionError::InvalidAccount("no account selected".to_string())
            })?;
            (self.active_connection(&inner)?, from)
        };
        transfer::execute(&connection, &self.extension, &from, to, amount).await
    }

    /// Transfer from an explicit account of the authorized set
    pub async fn transfer_from(
        &self,
        to: &str,
        amount: &str,
        from: &Account,
    ) -> Result<String, SessionError> {
        let connection = {
            let inner = self.shared.inner.lock().await;
            if !inner
                .state
                .accounts
                .iter()
                .any(|a| a.address == from.address)
            {
                return Err(SessionError::InvalidAccount(from.address.clone()));
            }
            self.active_connection(&inner)?
        };
        transfer::execute(&connection, &self.extension, from, to, amount).await
    }

    /// Re-encode an address under the active chain's SS58 prefix
    ///
    /// Pure display helper: empty string for `None`, for undecodable
    /// input, and when no chain is active.
    pub fn format_address(&self, addr: Option<&str>) -> String {
        let Some(addr) = addr else {
            return String::new();
        };
        let chain_id = match self.state_rx.borrow().chain_id.clone() {
            Some(id) => id,
            None => return String::new(),
        };
        let Ok(spec) = self.registry.lookup(&chain_id) else {
            return String::new();
        };
        address::reencode(addr, spec.prefix).unwrap_or_default()
    }

    /// Tear the session down: close the active connection and publish
    /// the disconnected state
    pub async fn shutdown(&self) {
        let mut inner = self.shared.inner.lock().await;
        if let Some(task) = inner.accounts_task.take() {
            task.abort();
        }
        if let Some(connection) = inner.connection.take() {
            connection.close().await;
        }
        // Bumping the generation invalidates any in-flight refresh
        let seq = inner.state.connection_seq + 1;
        inner.state = SessionState {
            connection_seq: seq,
            ..SessionState::default()
        };
        inner.publish();
        info!("Session shut down");
    }

    fn active_connection(
        &self,
        inner: &Inner,
    ) -> Result<Arc<dyn ChainConnection>, SessionError> {
        inner
            .connection
            .clone()
            .ok_or_else(|| SessionError::Connection("no active connection".to_string()))
    }

    fn queue_refresh(&self, inner: &Inner, seq: u64, addr: &str) {
        let Some(connection) = inner.connection.clone() else {
            return;
        };
        let request = RefreshRequest {
            seq,
            address: addr.to_string(),
            connection,
            properties: inner.properties.clone(),
        };
        if self.refresh_tx.send(request).is_err() {
            warn!("Balance synchronizer is no longer running");
        }
    }

    /// Start applying live account-set updates from the extension
    async fn spawn_accounts_listener(&self, inner: &mut Inner) {
        if inner.accounts_task.is_some() {
            return;
        }
        let stream = match self.extension.subscribe_accounts().await {
            Ok(stream) => stream,
            Err(e) => {
                debug!("Account subscription unavailable: {}", e);
                return;
            }
        };
        let session = self.clone();
        inner.accounts_task = Some(tokio::spawn(async move {
            let mut stream = stream;
            while let Some(accounts) = stream.next().await {
                session.apply_account_update(accounts).await;
            }
            debug!("Account subscription ended");
        }));
    }

    /// Replace the account set, revalidating the selection against it
    async fn apply_account_update(&self, accounts: Vec<Account>) {
        let mut inner = self.shared.inner.lock().await;
        if inner.state.status != SessionStatus::Ready {
            return;
        }

        let retained = inner.state.selected_address().and_then(|selected| {
            accounts.iter().find(|a| a.address == selected).cloned()
        });
        let selection_changed = retained.is_none();
        let next = retained.or_else(|| accounts.first().cloned());

        info!("Account set updated: {} account(s)", accounts.len());
        inner.state.accounts = accounts;
        inner.state.selected = next;
        if selection_changed {
            inner.state.balance = String::new();
        }
        inner.publish();

        if selection_changed {
            if let Some(selected) = inner.state.selected.clone() {
                let seq = inner.state.connection_seq;
                self.queue_refresh(&inner, seq, &selected.address);
            }
        }
    }
}
