//! Balance Synchronizer
//!
//! Re-derives the displayed balance whenever the (connection, selected
//! account) pair changes. Refresh requests carry the connection
//! generation they were issued for; a result whose generation or
//! account is no longer current is discarded, so a late response can
//! never overwrite a newer selection's balance.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::node::ChainConnection;
use crate::session::Shared;
use crate::types::ChainProperties;

/// One queued balance refresh
pub(crate) struct RefreshRequest {
    /// Connection generation this refresh belongs to
    pub seq: u64,
    /// Address of the account the refresh was issued for
    pub address: String,
    pub connection: Arc<dyn ChainConnection>,
    pub properties: ChainProperties,
}

/// Drive queued refreshes until the session is dropped
pub(crate) async fn run(mut rx: mpsc::UnboundedReceiver<RefreshRequest>, shared: Arc<Shared>) {
    while let Some(mut request) = rx.recv().await {
        // Only the newest queued request can still be current
        while let Ok(newer) = rx.try_recv() {
            request = newer;
        }

        match request.connection.available_balance(&request.address).await {
            Ok(raw) => {
                let formatted = format_balance(
                    raw,
                    request.properties.decimals,
                    &request.properties.symbol,
                );
                if shared
                    .apply_balance(request.seq, &request.address, formatted)
                    .await
                {
                    debug!("Balance refreshed for {}", request.address);
                } else {
                    debug!("Discarding stale balance result for {}", request.address);
                }
            }
            Err(e) => {
                // Non-fatal: the previous value stays on display
                warn!("Failed to fetch balance for {}: {}", request.address, e);
            }
        }
    }
}

/// Human-readable balance: scaled by the chain's decimals, fractional
/// part trimmed to four digits, symbol appended
pub fn format_balance(raw: u128, decimals: u32, symbol: &str) -> String {
    let Some(scale) = 10u128.checked_pow(decimals) else {
        return format!("{} {}", raw, symbol);
    };
    let whole = raw / scale;
    let frac = raw % scale;
    if frac == 0 {
        return format!("{} {}", whole, symbol);
    }

    let mut frac_digits = format!("{:0width$}", frac, width = decimals as usize);
    frac_digits.truncate(4);
    let frac_digits = frac_digits.trim_end_matches('0');
    if frac_digits.is_empty() {
        format!("{} {}", whole, symbol)
    } else {
        format!("{}.{} {}", whole, frac_digits, symbol)
    }
}
