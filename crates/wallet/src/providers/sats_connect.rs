//! Sats Connect relay provider.
//!
//! The fallback provider: the relay protocol needs no injected wallet,
//! so it is always constructible. Every call goes through the relay's
//! status envelope; failures carry the relay's own message, which is
//! surfaced verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use wallet_core::format_btc;

use crate::bridge::{find_payment_account, Account, BridgeError, SatsConnectBridge};
use crate::error::WalletError;
use crate::provider::{WalletConnection, WalletProvider};

/// Provider backed by the Sats Connect relay.
pub struct SatsConnectProvider {
    bridge: Arc<dyn SatsConnectBridge>,
}

impl SatsConnectProvider {
    pub fn new(bridge: Arc<dyn SatsConnectBridge>) -> Self {
        Self { bridge }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let response = self
            .bridge
            .request(method, params)
            .await
            .map_err(|err| match err {
                BridgeError::Rejected => WalletError::UserRejected,
                BridgeError::Other(message) => WalletError::Network(message),
            })?;
        response.into_result()
    }
}

#[async_trait]
impl WalletProvider for SatsConnectProvider {
    fn name(&self) -> &'static str {
        "sats-connect"
    }

    async fn connect(&self) -> Result<WalletConnection, WalletError> {
        let result = self
            .request("getAccounts", json!({"purposes": ["payment", "ordinals"]}))
            .await?;
        let accounts: Vec<Account> = serde_json::from_value(result)
            .map_err(|err| WalletError::Network(format!("malformed relay accounts: {err}")))?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        let account = find_payment_account(&accounts)
            .cloned()
            .ok_or(WalletError::NoPaymentAddress)?;
        tracing::debug!(address = %account.address, "relay wallet connected");
        Ok(WalletConnection {
            address: account.address,
        })
    }

    async fn get_balance(&self) -> Result<String, WalletError> {
        let result = self.request("getBalance", Value::Null).await?;
        // Relays have shipped the total both as a number and as a
        // decimal string.
        let sats = match result.get("total") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(|| WalletError::Network("malformed relay balance".into()))?;
        Ok(format_btc(sats))
    }

    async fn sign_message(&self, message: &str, address: &str) -> Result<String, WalletError> {
        let result = self
            .request(
                "signMessage",
                json!({"message": message, "address": address}),
            )
            .await?;
        result
            .get("signature")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| WalletError::SigningFailed("missing signature in response".into()))
    }

    async fn send_bitcoin(&self, recipient: &str, amount_sats: u64) -> Result<String, WalletError> {
        let result = self
            .request(
                "sendTransfer",
                json!({
                    "recipients": [{
                        "address": recipient,
                        "amount": amount_sats,
                    }],
                }),
            )
            .await?;
        let txid = result
            .get("txid")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                WalletError::BroadcastFailed("missing txid in sendTransfer response".into())
            })?;
        tracing::info!(%txid, amount_sats, "relay transfer sent");
        Ok(txid)
    }

    async fn disconnect(&self) {
        // The relay protocol has no session to tear down.
        tracing::debug!("relay wallet disconnected");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
