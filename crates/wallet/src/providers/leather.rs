//! Leather wallet provider.
//!
//! Leather exposes one `request(method, params)` envelope. Transfers
//! are native: `sendTransfer` signs and broadcasts inside the wallet,
//! so no local transaction assembly happens here. Amounts cross the
//! envelope as decimal strings of satoshis.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use wallet_core::format_btc;

use crate::bridge::{BridgeError, LeatherBridge, WalletEnvironment};
use crate::chain_source::ChainSource;
use crate::error::WalletError;
use crate::provider::{WalletConnection, WalletProvider};

/// One entry in a `getAddresses` response.
#[derive(Debug, Clone, Deserialize)]
struct AddressEntry {
    address: String,
    /// Script type, e.g. `p2wpkh` or `p2tr`.
    #[serde(rename = "type", default)]
    kind: String,
    /// Asset symbol; Leather lists STX addresses alongside BTC.
    #[serde(default)]
    symbol: String,
}

/// Provider backed by an injected Leather wallet.
pub struct LeatherProvider {
    env: Arc<dyn WalletEnvironment>,
    chain: Arc<dyn ChainSource>,
    bridge: Mutex<Option<Arc<dyn LeatherBridge>>>,
}

impl LeatherProvider {
    pub fn new(env: Arc<dyn WalletEnvironment>, chain: Arc<dyn ChainSource>) -> Self {
        Self {
            env,
            chain,
            bridge: Mutex::new(None),
        }
    }

    fn bridge(&self) -> Result<Arc<dyn LeatherBridge>, WalletError> {
        self.bridge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(WalletError::NotConnected)
    }

    /// Ask the wallet for its addresses and pick the native-segwit BTC
    /// one. Leather mixes address types and chains in one list.
    async fn payment_address(
        &self,
        bridge: &Arc<dyn LeatherBridge>,
    ) -> Result<String, WalletError> {
        let result = bridge
            .request("getAddresses", None)
            .await
            .map_err(map_bridge_error)?;
        let entries: Vec<AddressEntry> =
            serde_json::from_value(result.get("addresses").cloned().unwrap_or_default())
                .unwrap_or_default();
        entries
            .into_iter()
            .find(|entry| entry.kind == "p2wpkh" && entry.symbol == "BTC")
            .map(|entry| entry.address)
            .ok_or(WalletError::NoPaymentAddress)
    }
}

#[async_trait]
impl WalletProvider for LeatherProvider {
    fn name(&self) -> &'static str {
        "leather"
    }

    async fn connect(&self) -> Result<WalletConnection, WalletError> {
        let bridge = self
            .env
            .leather()
            .ok_or(WalletError::Unavailable("Leather"))?;

        let address = self.payment_address(&bridge).await?;
        tracing::debug!(%address, "leather connected");

        *self
            .bridge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bridge);
        Ok(WalletConnection { address })
    }

    async fn get_balance(&self) -> Result<String, WalletError> {
        let bridge = self.bridge()?;
        let address = self.payment_address(&bridge).await?;
        let sats = self.chain.balance_sats(&address).await?;
        Ok(format_btc(sats))
    }

    async fn sign_message(&self, message: &str, _address: &str) -> Result<String, WalletError> {
        let bridge = self.bridge()?;
        let result = bridge
            .request(
                "signMessage",
                Some(json!({
                    "message": message,
                    "paymentType": "p2wpkh",
                })),
            )
            .await
            .map_err(map_signing_error)?;
        result
            .get("signature")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| WalletError::SigningFailed("missing signature in response".into()))
    }

    async fn send_bitcoin(&self, recipient: &str, amount_sats: u64) -> Result<String, WalletError> {
        let bridge = self.bridge()?;
        let result = bridge
            .request(
                "sendTransfer",
                Some(json!({
                    "recipients": [{
                        "address": recipient,
                        // Envelope convention: satoshi amounts travel
                        // as decimal strings.
                        "amount": amount_sats.to_string(),
                    }],
                })),
            )
            .await
            .map_err(map_send_error)?;
        let txid = result
            .get("txid")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                WalletError::BroadcastFailed("missing txid in sendTransfer response".into())
            })?;
        tracing::info!(%txid, amount_sats, "leather transfer sent");
        Ok(txid)
    }

    async fn disconnect(&self) {
        *self
            .bridge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        tracing::debug!("leather disconnected");
    }
}

fn map_bridge_error(err: BridgeError) -> WalletError {
    match err {
        BridgeError::Rejected => WalletError::UserRejected,
        BridgeError::Other(message) => WalletError::Network(message),
    }
}

fn map_signing_error(err: BridgeError) -> WalletError {
    match err {
        BridgeError::Rejected => WalletError::UserRejected,
        BridgeError::Other(message) => WalletError::SigningFailed(message),
    }
}

fn map_send_error(err: BridgeError) -> WalletError {
    match err {
        BridgeError::Rejected => WalletError::UserRejected,
        BridgeError::Other(message) => WalletError::BroadcastFailed(message),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    use crate::bridge::{PhantomBridge, RelayResponse, SatsConnectBridge};
    use crate::chain_source::Utxo;

    const BTC_ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    struct MockBridge {
        requests: Mutex<Vec<(String, Option<Value>)>>,
        addresses: Value,
        send_result: Value,
    }

    impl MockBridge {
        fn with_btc_address() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                addresses: json!({
                    "addresses": [
                        {"address": "SP2J6ZY4...", "type": "stacks", "symbol": "STX"},
                        {"address": "bc1ptaproot", "type": "p2tr", "symbol": "BTC"},
                        {"address": BTC_ADDR, "type": "p2wpkh", "symbol": "BTC"}
                    ]
                }),
                send_result: json!({"txid": "leather-txid"}),
            }
        }
    }

    #[async_trait]
    impl LeatherBridge for MockBridge {
        async fn request(
            &self,
            method: &str,
            params: Option<Value>,
        ) -> Result<Value, BridgeError> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_owned(), params));
            match method {
                "getAddresses" => Ok(self.addresses.clone()),
                "sendTransfer" => Ok(self.send_result.clone()),
                "signMessage" => Ok(json!({"signature": "leather-sig"})),
                other => Err(BridgeError::Other(format!("unknown method {other}"))),
            }
        }
    }

    struct MockEnv {
        leather: Option<Arc<MockBridge>>,
    }

    impl WalletEnvironment for MockEnv {
        fn phantom(&self) -> Option<Arc<dyn PhantomBridge>> {
            None
        }

        fn leather(&self) -> Option<Arc<dyn LeatherBridge>> {
            self.leather
                .clone()
                .map(|bridge| bridge as Arc<dyn LeatherBridge>)
        }

        fn sats_connect(&self) -> Arc<dyn SatsConnectBridge> {
            struct NoRelay;
            #[async_trait]
            impl SatsConnectBridge for NoRelay {
                async fn request(
                    &self,
                    _method: &str,
                    _params: Value,
                ) -> Result<RelayResponse, BridgeError> {
                    Err(BridgeError::Other("no relay in this test".into()))
                }
            }
            Arc::new(NoRelay)
        }
    }

    struct StaticChain(u64);

    #[async_trait]
    impl ChainSource for StaticChain {
        async fn balance_sats(&self, _address: &str) -> Result<u64, WalletError> {
            Ok(self.0)
        }
        async fn utxos(&self, _address: &str) -> Result<Vec<Utxo>, WalletError> {
            Ok(vec![])
        }
        async fn tx_hex(&self, _txid: &str) -> Result<String, WalletError> {
            Err(WalletError::Network("not used".into()))
        }
        async fn broadcast(&self, _raw_tx: &[u8]) -> Result<String, WalletError> {
            Err(WalletError::Network("not used".into()))
        }
    }

    fn provider(bridge: Option<Arc<MockBridge>>, balance: u64) -> LeatherProvider {
        LeatherProvider::new(Arc::new(MockEnv { leather: bridge }), Arc::new(StaticChain(balance)))
    }

    #[tokio::test]
    async fn connect_picks_native_segwit_btc_address() {
        let provider = provider(Some(Arc::new(MockBridge::with_btc_address())), 0);
        let connection = provider.connect().await.unwrap();
        assert_eq!(connection.address, BTC_ADDR);
    }

    #[tokio::test]
    async fn connect_fails_when_not_injected() {
        let provider = provider(None, 0);
        let err = provider.connect().await.unwrap_err();
        assert_eq!(err, WalletError::Unavailable("Leather"));
    }

    #[tokio::test]
    async fn connect_fails_without_btc_p2wpkh_entry() {
        let bridge = Arc::new(MockBridge {
            requests: Mutex::new(Vec::new()),
            addresses: json!({
                "addresses": [
                    {"address": "SP2J6ZY4...", "type": "stacks", "symbol": "STX"},
                    {"address": "bc1ptaproot", "type": "p2tr", "symbol": "BTC"}
                ]
            }),
            send_result: json!({}),
        });
        let err = provider(Some(bridge), 0).connect().await.unwrap_err();
        assert_eq!(err, WalletError::NoPaymentAddress);
    }

    #[tokio::test]
    async fn balance_formats_btc() {
        let provider = provider(Some(Arc::new(MockBridge::with_btc_address())), 150_000_000);
        provider.connect().await.unwrap();
        assert_eq!(provider.get_balance().await.unwrap(), "1.5");
    }

    #[tokio::test]
    async fn send_uses_string_satoshi_amounts() {
        let bridge = Arc::new(MockBridge::with_btc_address());
        let provider = provider(Some(bridge.clone()), 0);
        provider.connect().await.unwrap();

        let txid = provider.send_bitcoin("bc1qrecipient", 25_000).await.unwrap();
        assert_eq!(txid, "leather-txid");

        let requests = bridge.requests.lock().unwrap();
        let (method, params) = requests.last().unwrap();
        assert_eq!(method, "sendTransfer");
        let recipient = &params.as_ref().unwrap()["recipients"][0];
        assert_eq!(recipient["address"], "bc1qrecipient");
        assert_eq!(recipient["amount"], "25000");
    }

    #[tokio::test]
    async fn operations_require_connect() {
        let provider = provider(Some(Arc::new(MockBridge::with_btc_address())), 0);
        let err = provider.send_bitcoin("bc1qrecipient", 1_500).await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
    }

    #[tokio::test]
    async fn sign_message_returns_wallet_signature() {
        let provider = provider(Some(Arc::new(MockBridge::with_btc_address())), 0);
        provider.connect().await.unwrap();
        let signature = provider.sign_message("hello", BTC_ADDR).await.unwrap();
        assert_eq!(signature, "leather-sig");
    }
}
