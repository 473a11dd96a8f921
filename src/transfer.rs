//! Transfer Executor
//!
//! Builds, signs, and submits a value transfer against the active
//! connection using a signer capability from the Wallet Bridge. Session
//! state is never touched here; a failed transfer leaves the session
//! exactly as it was.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::SessionError;
use crate::extension::WalletExtension;
use crate::node::ChainConnection;
use crate::types::Account;

/// Validate a user-entered amount as a non-negative count of the
/// smallest denomination
pub fn parse_amount(amount: &str) -> Result<u128, SessionError> {
    let value = Decimal::from_str(amount.trim())
        .map_err(|_| SessionError::InvalidAmount(amount.to_string()))?;
    if value.is_sign_negative() {
        return Err(SessionError::InvalidAmount(amount.to_string()));
    }
    value
        .trunc()
        .to_u128()
        .ok_or_else(|| SessionError::InvalidAmount(amount.to_string()))
}

/// Run one transfer end to end, returning the transaction hash once
/// the node acknowledges receipt
pub(crate) async fn execute(
    connection: &Arc<dyn ChainConnection>,
    extension: &Arc<dyn WalletExtension>,
    from: &Account,
    to: &str,
    amount: &str,
) -> Result<String, SessionError> {
    let planck = parse_amount(amount)?;

    if !connection.supports_transfer() {
        return Err(SessionError::Unsupported(
            "balance transfer is not available on this chain".to_string(),
        ));
    }

    let signer = extension.signer(&from.meta.source).await?;
    let hash = connection
        .submit_transfer(&from.address, to, planck, signer)
        .await?;
    info!("Transfer of {} from {} accepted: {}", amount, from.address, hash);
    Ok(hash)
}
