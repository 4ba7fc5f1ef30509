//! Scripted walkthrough of the dashboard wallet flows.
//!
//! Runs connect, balance, transfer, and disconnect against an
//! in-memory wallet environment: a simulated injected wallet that
//! auto-approves signing, and a simulated chain with a couple of
//! funded outputs. Nothing leaves the process, so the walkthrough is
//! safe to run anywhere.
//!
//! ```bash
//! RUST_LOG=info cargo run -p dashboard-cli
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use dashboard::{BitcoinService, Notifier, TransferForm, WalletStore};
use wallet::{
    Account, AccountPurpose, BridgeError, ChainSource, FixedFee, InputsToSign, LeatherBridge,
    PhantomBridge, RelayResponse, SatsConnectBridge, Utxo, WalletEnvironment, WalletError,
};
use wallet_core::{Chain, Network};

const PAYMENT_ADDR: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("dashboard walkthrough starting");

    // -----------------------------------------------------------------------
    // Environment setup
    // -----------------------------------------------------------------------

    let chain = Arc::new(SimulatedChain::with_utxos(vec![
        Utxo {
            txid: hex::encode([0xaa; 32]),
            vout: 0,
            value: 150_000,
        },
        Utxo {
            txid: hex::encode([0xbb; 32]),
            vout: 0,
            value: 50_000,
        },
    ]));
    let service = Arc::new(BitcoinService::new(
        Arc::new(SimulatedEnv::default()),
        chain,
        Arc::new(FixedFee::default()),
        Network::Mainnet,
    ));
    let store = WalletStore::new(service.clone());

    // -----------------------------------------------------------------------
    // Connect
    // -----------------------------------------------------------------------

    store.connect(Chain::Bitcoin).await;
    let state = store.state(Chain::Bitcoin);
    tracing::info!(
        connected = state.is_connected,
        address = state.address.as_deref().unwrap_or("-"),
        balance = state.balance.as_deref().unwrap_or("-"),
        "bitcoin wallet state"
    );

    // -----------------------------------------------------------------------
    // Transfer through the form
    // -----------------------------------------------------------------------

    let toasts = LogNotifier;
    let mut form = TransferForm::new();
    form.set_recipient(RECIPIENT);
    form.blur_recipient(&toasts);
    form.set_amount("0.0005");
    form.blur_amount(&toasts);
    match form.submit(service.as_ref(), &toasts).await {
        Some(txid) => tracing::info!(%txid, "transfer broadcast"),
        None => tracing::warn!("transfer did not complete"),
    }

    store.refresh_balance(Chain::Bitcoin).await;
    let state = store.state(Chain::Bitcoin);
    tracing::info!(
        balance = state.balance.as_deref().unwrap_or("-"),
        "balance after transfer"
    );

    // -----------------------------------------------------------------------
    // Disconnect
    // -----------------------------------------------------------------------

    store.disconnect(Chain::Bitcoin).await;
    tracing::info!(
        connected = store.state(Chain::Bitcoin).is_connected,
        "walkthrough finished"
    );
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Routes form notifications to the log.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!(message, "toast");
    }
    fn error(&self, message: &str) {
        tracing::error!(message, "toast");
    }
}

// ---------------------------------------------------------------------------
// Simulated wallet environment
// ---------------------------------------------------------------------------

/// An injected wallet that approves everything without prompting.
#[derive(Default)]
struct SimulatedPhantom;

#[async_trait]
impl PhantomBridge for SimulatedPhantom {
    async fn request_accounts(&self) -> Result<Vec<Account>, BridgeError> {
        Ok(vec![Account {
            address: PAYMENT_ADDR.to_owned(),
            purpose: AccountPurpose::Payment,
        }])
    }

    async fn sign_message(&self, _address: &str, message: &[u8]) -> Result<Vec<u8>, BridgeError> {
        Ok(message.to_vec())
    }

    async fn sign_psbt(
        &self,
        psbt: &[u8],
        _inputs_to_sign: &[InputsToSign],
    ) -> Result<Vec<u8>, BridgeError> {
        // A real wallet would sign and finalize; the simulation hands
        // back the unsigned transaction bytes.
        let psbt = bitcoin::Psbt::deserialize(psbt)
            .map_err(|e| BridgeError::Other(e.to_string()))?;
        Ok(bitcoin::consensus::encode::serialize(&psbt.unsigned_tx))
    }
}

#[derive(Default)]
struct SimulatedEnv;

impl WalletEnvironment for SimulatedEnv {
    fn phantom(&self) -> Option<Arc<dyn PhantomBridge>> {
        Some(Arc::new(SimulatedPhantom))
    }

    fn leather(&self) -> Option<Arc<dyn LeatherBridge>> {
        None
    }

    fn sats_connect(&self) -> Arc<dyn SatsConnectBridge> {
        struct OfflineRelay;
        #[async_trait]
        impl SatsConnectBridge for OfflineRelay {
            async fn request(
                &self,
                _method: &str,
                _params: serde_json::Value,
            ) -> Result<RelayResponse, BridgeError> {
                Err(BridgeError::Other("relay offline in walkthrough".into()))
            }
        }
        Arc::new(OfflineRelay)
    }
}

// ---------------------------------------------------------------------------
// Simulated chain
// ---------------------------------------------------------------------------

/// In-memory chain: fixed UTXO set, synthesized funding transactions,
/// and a balance that drops once a transaction is "broadcast".
struct SimulatedChain {
    utxos: Vec<Utxo>,
    funding_hex: HashMap<String, String>,
    spent: Mutex<u64>,
}

impl SimulatedChain {
    fn with_utxos(utxos: Vec<Utxo>) -> Self {
        let script = RECIPIENT
            .parse::<bitcoin::Address<bitcoin::address::NetworkUnchecked>>()
            .expect("valid demo address")
            .require_network(bitcoin::Network::Bitcoin)
            .expect("mainnet demo address")
            .script_pubkey();
        let mut funding_hex = HashMap::new();
        for utxo in &utxos {
            let tx = bitcoin::Transaction {
                version: bitcoin::transaction::Version::TWO,
                lock_time: bitcoin::absolute::LockTime::ZERO,
                input: vec![bitcoin::TxIn {
                    previous_output: bitcoin::OutPoint::null(),
                    script_sig: bitcoin::ScriptBuf::new(),
                    sequence: bitcoin::Sequence::MAX,
                    witness: bitcoin::Witness::default(),
                }],
                output: vec![bitcoin::TxOut {
                    value: bitcoin::Amount::from_sat(utxo.value),
                    script_pubkey: script.clone(),
                }],
            };
            funding_hex.insert(
                utxo.txid.clone(),
                hex::encode(bitcoin::consensus::encode::serialize(&tx)),
            );
        }
        Self {
            utxos,
            funding_hex,
            spent: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ChainSource for SimulatedChain {
    async fn balance_sats(&self, _address: &str) -> Result<u64, WalletError> {
        let total: u64 = self.utxos.iter().map(|u| u.value).sum();
        Ok(total.saturating_sub(*self.spent.lock().unwrap_or_else(|p| p.into_inner())))
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
        let tx: bitcoin::Transaction = bitcoin::consensus::encode::deserialize(raw_tx)
            .map_err(|e| WalletError::BroadcastFailed(e.to_string()))?;
        let txid = tx.compute_txid().to_string();

        // Mark the amount leaving the simulated wallet: everything
        // except the change output.
        let outgoing: u64 = tx
            .output
            .first()
            .map(|o| o.value.to_sat())
            .unwrap_or_default();
        *self.spent.lock().unwrap_or_else(|p| p.into_inner()) += outgoing + 500;

        tracing::debug!(%txid, outputs = tx.output.len(), "simulated broadcast");
        Ok(txid)
    }
}
