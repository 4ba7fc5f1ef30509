//! Phantom wallet provider.
//!
//! Phantom only signs; everything else is done here. A transfer runs
//! the full pipeline: fetch the UTXO set, fetch each funding
//! transaction for witness data, assemble an unsigned PSBT that spends
//! the entire set, hand it to the wallet for signing, then broadcast
//! the signed result through the chain source.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use wallet_core::{format_btc, Network};

use crate::bridge::{
    find_payment_account, Account, BridgeError, InputsToSign, PhantomBridge, WalletEnvironment,
};
use crate::builder::{build_transfer_psbt, FeeEstimator, TransferInput};
use crate::chain_source::ChainSource;
use crate::error::WalletError;
use crate::provider::{WalletConnection, WalletProvider};

/// Provider backed by an injected Phantom wallet.
pub struct PhantomProvider {
    env: Arc<dyn WalletEnvironment>,
    chain: Arc<dyn ChainSource>,
    fees: Arc<dyn FeeEstimator>,
    network: Network,
    // Session state: set by connect, cleared by disconnect. Lock is
    // never held across an await.
    bridge: Mutex<Option<Arc<dyn PhantomBridge>>>,
}

impl PhantomProvider {
    pub fn new(
        env: Arc<dyn WalletEnvironment>,
        chain: Arc<dyn ChainSource>,
        fees: Arc<dyn FeeEstimator>,
        network: Network,
    ) -> Self {
        Self {
            env,
            chain,
            fees,
            network,
            bridge: Mutex::new(None),
        }
    }

    fn bridge(&self) -> Result<Arc<dyn PhantomBridge>, WalletError> {
        self.bridge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(WalletError::NotConnected)
    }

    async fn payment_account(
        &self,
        bridge: &Arc<dyn PhantomBridge>,
    ) -> Result<Account, WalletError> {
        let accounts = bridge
            .request_accounts()
            .await
            .map_err(map_connect_error)?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        find_payment_account(&accounts)
            .cloned()
            .ok_or(WalletError::NoPaymentAddress)
    }

    /// Fetch the funding output for every UTXO, preserving order.
    async fn prepare_inputs(&self, address: &str) -> Result<Vec<TransferInput>, WalletError> {
        let utxos = self.chain.utxos(address).await?;
        if utxos.is_empty() {
            return Err(WalletError::NoUnspentOutputs);
        }

        let mut inputs = Vec::with_capacity(utxos.len());
        for utxo in utxos {
            let tx_hex = self.chain.tx_hex(&utxo.txid).await?;
            let tx = crate::builder::parse_raw_tx(&tx_hex)?;
            let prev_txout = tx.output.get(utxo.vout as usize).cloned().ok_or_else(|| {
                WalletError::Network(format!(
                    "funding transaction {} has no output {}",
                    utxo.txid, utxo.vout
                ))
            })?;
            inputs.push(TransferInput { utxo, prev_txout });
        }
        Ok(inputs)
    }
}

#[async_trait]
impl WalletProvider for PhantomProvider {
    fn name(&self) -> &'static str {
        "phantom"
    }

    async fn connect(&self) -> Result<WalletConnection, WalletError> {
        let bridge = self
            .env
            .phantom()
            .ok_or(WalletError::Unavailable("Phantom"))?;

        let account = self.payment_account(&bridge).await?;
        tracing::debug!(address = %account.address, "phantom connected");

        *self
            .bridge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bridge);
        Ok(WalletConnection {
            address: account.address,
        })
    }

    async fn get_balance(&self) -> Result<String, WalletError> {
        let bridge = self.bridge()?;
        let account = self.payment_account(&bridge).await?;
        let sats = self.chain.balance_sats(&account.address).await?;
        Ok(format_btc(sats))
    }

    async fn sign_message(&self, message: &str, address: &str) -> Result<String, WalletError> {
        let bridge = self.bridge()?;
        let signature = bridge
            .sign_message(address, message.as_bytes())
            .await
            .map_err(map_signing_error)?;
        Ok(BASE64.encode(signature))
    }

    async fn send_bitcoin(&self, recipient: &str, amount_sats: u64) -> Result<String, WalletError> {
        let bridge = self.bridge()?;
        let account = self.payment_account(&bridge).await?;

        let inputs = self.prepare_inputs(&account.address).await?;
        let fee_sats = self.fees.fee_sats(inputs.len(), 2);
        let transfer = build_transfer_psbt(
            &inputs,
            recipient,
            amount_sats,
            &account.address,
            fee_sats,
            self.network,
        )?;

        // One directive per input, each naming the payment address
        // that controls it.
        let inputs_to_sign: Vec<InputsToSign> = (0..inputs.len() as u32)
            .map(|index| InputsToSign {
                address: account.address.clone(),
                signing_indexes: vec![index],
            })
            .collect();

        let signed_tx = bridge
            .sign_psbt(&transfer.psbt.serialize(), &inputs_to_sign)
            .await
            .map_err(map_signing_error)?;

        let txid = self.chain.broadcast(&signed_tx).await?;
        tracing::info!(
            %txid,
            amount_sats,
            fee_sats,
            inputs = inputs.len(),
            "phantom transfer broadcast"
        );
        Ok(txid)
    }

    async fn disconnect(&self) {
        *self
            .bridge
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        tracing::debug!("phantom disconnected");
    }
}

fn map_connect_error(err: BridgeError) -> WalletError {
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use bitcoin::{Amount, TxOut};

    use crate::bridge::{AccountPurpose, LeatherBridge, RelayResponse, SatsConnectBridge};
    use crate::builder::{parse_address, FixedFee};
    use crate::chain_source::Utxo;

    const PAYMENT_ADDR: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    // -- mock environment ---------------------------------------------------

    struct MockBridge {
        accounts: Vec<Account>,
        signed_calls: Mutex<Vec<(Vec<u8>, Vec<InputsToSign>)>>,
    }

    impl MockBridge {
        fn with_payment_account() -> Self {
            Self {
                accounts: vec![
                    Account {
                        address: "bc1qordinals".into(),
                        purpose: AccountPurpose::Ordinals,
                    },
                    Account {
                        address: PAYMENT_ADDR.into(),
                        purpose: AccountPurpose::Payment,
                    },
                ],
                signed_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PhantomBridge for MockBridge {
        async fn request_accounts(&self) -> Result<Vec<Account>, BridgeError> {
            Ok(self.accounts.clone())
        }

        async fn sign_message(
            &self,
            _address: &str,
            message: &[u8],
        ) -> Result<Vec<u8>, BridgeError> {
            let mut sig = message.to_vec();
            sig.reverse();
            Ok(sig)
        }

        async fn sign_psbt(
            &self,
            psbt: &[u8],
            inputs_to_sign: &[InputsToSign],
        ) -> Result<Vec<u8>, BridgeError> {
            self.signed_calls
                .lock()
                .unwrap()
                .push((psbt.to_vec(), inputs_to_sign.to_vec()));
            Ok(b"signed-raw-tx".to_vec())
        }
    }

    struct MockEnv {
        phantom: Option<Arc<MockBridge>>,
    }

    impl WalletEnvironment for MockEnv {
        fn phantom(&self) -> Option<Arc<dyn PhantomBridge>> {
            self.phantom
                .clone()
                .map(|bridge| bridge as Arc<dyn PhantomBridge>)
        }

        fn leather(&self) -> Option<Arc<dyn LeatherBridge>> {
            None
        }

        fn sats_connect(&self) -> Arc<dyn SatsConnectBridge> {
            struct NoRelay;
            #[async_trait]
            impl SatsConnectBridge for NoRelay {
                async fn request(
                    &self,
                    _method: &str,
                    _params: serde_json::Value,
                ) -> Result<RelayResponse, BridgeError> {
                    Err(BridgeError::Other("no relay in this test".into()))
                }
            }
            Arc::new(NoRelay)
        }
    }

    struct MockChain {
        balance: u64,
        utxos: Vec<Utxo>,
        funding_hex: std::collections::HashMap<String, String>,
        broadcasts: Mutex<Vec<Vec<u8>>>,
    }

    impl MockChain {
        /// One funding transaction per UTXO, each with the UTXO's value
        /// at its vout.
        fn funding(utxos: Vec<Utxo>) -> Self {
            let script = parse_address(PAYMENT_ADDR, bitcoin::Network::Bitcoin)
                .unwrap()
                .script_pubkey();
            let mut funding_hex = std::collections::HashMap::new();
            for utxo in &utxos {
                let outputs = (0..=utxo.vout)
                    .map(|vout| TxOut {
                        value: Amount::from_sat(if vout == utxo.vout { utxo.value } else { 1 }),
                        script_pubkey: script.clone(),
                    })
                    .collect();
                // A coinbase-style input keeps the legacy encoding
                // unambiguous (zero inputs would read as a segwit
                // marker).
                let tx = bitcoin::Transaction {
                    version: bitcoin::transaction::Version::TWO,
                    lock_time: bitcoin::absolute::LockTime::ZERO,
                    input: vec![bitcoin::TxIn {
                        previous_output: bitcoin::OutPoint::null(),
                        script_sig: bitcoin::ScriptBuf::new(),
                        sequence: bitcoin::Sequence::MAX,
                        witness: bitcoin::Witness::default(),
                    }],
                    output: outputs,
                };
                funding_hex.insert(
                    utxo.txid.clone(),
                    hex::encode(bitcoin::consensus::encode::serialize(&tx)),
                );
            }
            Self {
                balance: utxos.iter().map(|u| u.value).sum(),
                utxos,
                funding_hex,
                broadcasts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainSource for MockChain {
        async fn balance_sats(&self, _address: &str) -> Result<u64, WalletError> {
            Ok(self.balance)
        }

        async fn utxos(&self, _address: &str) -> Result<Vec<Utxo>, WalletError> {
            Ok(self.utxos.clone())
        }

        async fn tx_hex(&self, txid: &str) -> Result<String, WalletError> {
            self.funding_hex
                .get(txid)
                .cloned()
                .ok_or_else(|| WalletError::Network(format!("unknown txid {txid}")))
        }

        async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, WalletError> {
            self.broadcasts.lock().unwrap().push(raw_tx.to_vec());
            Ok("txid-from-broadcast".into())
        }
    }

    fn provider(bridge: Option<Arc<MockBridge>>, chain: Arc<MockChain>) -> PhantomProvider {
        PhantomProvider::new(
            Arc::new(MockEnv { phantom: bridge }),
            chain,
            Arc::new(FixedFee::default()),
            Network::Mainnet,
        )
    }

    fn utxo(txid_byte: u8, vout: u32, value: u64) -> Utxo {
        Utxo {
            txid: hex::encode([txid_byte; 32]),
            vout,
            value,
        }
    }

    // -- tests --------------------------------------------------------------

    #[tokio::test]
    async fn connect_returns_payment_address() {
        let chain = Arc::new(MockChain::funding(vec![]));
        let provider = provider(Some(Arc::new(MockBridge::with_payment_account())), chain);
        let connection = provider.connect().await.unwrap();
        assert_eq!(connection.address, PAYMENT_ADDR);
    }

    #[tokio::test]
    async fn connect_fails_when_not_injected() {
        let chain = Arc::new(MockChain::funding(vec![]));
        let provider = provider(None, chain);
        let err = provider.connect().await.unwrap_err();
        assert_eq!(err, WalletError::Unavailable("Phantom"));
        assert_eq!(err.to_string(), "Phantom wallet not available");
    }

    #[tokio::test]
    async fn connect_fails_without_payment_account() {
        let bridge = Arc::new(MockBridge {
            accounts: vec![Account {
                address: "bc1qordinals".into(),
                purpose: AccountPurpose::Ordinals,
            }],
            signed_calls: Mutex::new(Vec::new()),
        });
        let chain = Arc::new(MockChain::funding(vec![]));
        let err = provider(Some(bridge), chain).connect().await.unwrap_err();
        assert_eq!(err, WalletError::NoPaymentAddress);
    }

    #[tokio::test]
    async fn connect_fails_on_empty_account_list() {
        let bridge = Arc::new(MockBridge {
            accounts: vec![],
            signed_calls: Mutex::new(Vec::new()),
        });
        let chain = Arc::new(MockChain::funding(vec![]));
        let err = provider(Some(bridge), chain).connect().await.unwrap_err();
        assert_eq!(err, WalletError::NoAccounts);
    }

    #[tokio::test]
    async fn operations_require_connect() {
        let chain = Arc::new(MockChain::funding(vec![]));
        let provider = provider(Some(Arc::new(MockBridge::with_payment_account())), chain);
        let err = provider.get_balance().await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
        let err = provider.send_bitcoin(RECIPIENT, 1_500).await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
    }

    #[tokio::test]
    async fn balance_is_formatted_btc() {
        let chain = Arc::new(MockChain::funding(vec![utxo(0xaa, 0, 100_000)]));
        let provider = provider(Some(Arc::new(MockBridge::with_payment_account())), chain);
        provider.connect().await.unwrap();
        assert_eq!(provider.get_balance().await.unwrap(), "0.001");
    }

    #[tokio::test]
    async fn send_runs_full_pipeline() {
        let bridge = Arc::new(MockBridge::with_payment_account());
        let chain = Arc::new(MockChain::funding(vec![
            utxo(0xaa, 0, 60_000),
            utxo(0xbb, 1, 50_000),
        ]));
        let provider = provider(Some(bridge.clone()), chain.clone());
        provider.connect().await.unwrap();

        let txid = provider.send_bitcoin(RECIPIENT, 50_000).await.unwrap();
        assert_eq!(txid, "txid-from-broadcast");

        // The wallet saw one PSBT with a signing directive per input,
        // each under the payment address.
        let calls = bridge.signed_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (psbt_bytes, inputs_to_sign) = &calls[0];
        assert_eq!(inputs_to_sign.len(), 2);
        for (index, directive) in inputs_to_sign.iter().enumerate() {
            assert_eq!(directive.address, PAYMENT_ADDR);
            assert_eq!(directive.signing_indexes, vec![index as u32]);
        }

        let psbt = bitcoin::Psbt::deserialize(psbt_bytes).unwrap();
        assert_eq!(psbt.unsigned_tx.input.len(), 2);
        assert_eq!(psbt.unsigned_tx.output[0].value, Amount::from_sat(50_000));
        // 110_000 in, 50_000 out, 500 fee, 59_500 change.
        assert_eq!(psbt.unsigned_tx.output[1].value, Amount::from_sat(59_500));

        // The broadcast body is exactly what the wallet returned.
        let broadcasts = chain.broadcasts.lock().unwrap();
        assert_eq!(broadcasts.as_slice(), &[b"signed-raw-tx".to_vec()]);
    }

    #[tokio::test]
    async fn send_fails_without_utxos() {
        let chain = Arc::new(MockChain::funding(vec![]));
        let provider = provider(Some(Arc::new(MockBridge::with_payment_account())), chain);
        provider.connect().await.unwrap();
        let err = provider.send_bitcoin(RECIPIENT, 1_500).await.unwrap_err();
        assert_eq!(err, WalletError::NoUnspentOutputs);
    }

    #[tokio::test]
    async fn sign_message_returns_base64() {
        let chain = Arc::new(MockChain::funding(vec![]));
        let provider = provider(Some(Arc::new(MockBridge::with_payment_account())), chain);
        provider.connect().await.unwrap();
        let signature = provider.sign_message("hi", PAYMENT_ADDR).await.unwrap();
        assert_eq!(signature, BASE64.encode(b"ih"));
    }

    #[tokio::test]
    async fn disconnect_clears_the_session() {
        let chain = Arc::new(MockChain::funding(vec![]));
        let provider = provider(Some(Arc::new(MockBridge::with_payment_account())), chain);
        provider.connect().await.unwrap();
        provider.disconnect().await;
        let err = provider.get_balance().await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
        // Idempotent.
        provider.disconnect().await;
    }
}
