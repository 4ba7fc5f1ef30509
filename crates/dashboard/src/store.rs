//! Per-chain wallet state for the dashboard.
//!
//! [`WalletStore`] tracks one [`ChainState`] per chain and drives the
//! chain's [`ChainService`] through connect/disconnect/refresh flows.
//! State transitions always land in a settled state: `is_loading` never
//! survives a completed operation, and errors are stored as strings
//! ready for display.
//!
//! A connect that succeeds but cannot fetch the balance is still a
//! successful connect; the balance stays empty and the failure goes to
//! the log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wallet_core::Chain;

use crate::error::ServiceError;
use crate::service::ChainService;

// ---------------------------------------------------------------------------
// ChainState
// ---------------------------------------------------------------------------

/// Connection state for one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainState {
    /// Whether a wallet session is established.
    pub is_connected: bool,
    /// Whether a connect or refresh is in progress.
    pub is_loading: bool,
    /// Connected wallet address.
    pub address: Option<String>,
    /// Last fetched balance, formatted for display.
    pub balance: Option<String>,
    /// Last error message, for display.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// WalletStore
// ---------------------------------------------------------------------------

/// Services for chains without wallet support yet.
struct UnsupportedChain(Chain);

#[async_trait::async_trait]
impl ChainService for UnsupportedChain {
    async fn connect(&self) -> Result<wallet::WalletConnection, ServiceError> {
        Err(ServiceError::Unsupported(self.0))
    }

    async fn get_balance(&self) -> Result<String, ServiceError> {
        Err(ServiceError::Unsupported(self.0))
    }

    async fn send_transfer(&self, _: &str, _: u64) -> Result<String, ServiceError> {
        Err(ServiceError::Unsupported(self.0))
    }

    async fn sign_message(&self, _: &str, _: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Unsupported(self.0))
    }

    async fn disconnect(&self) {}
}

/// Dashboard-wide wallet state, one slot per chain.
pub struct WalletStore {
    services: HashMap<Chain, Arc<dyn ChainService>>,
    // Read and written only in short scopes, never across an await.
    states: Mutex<HashMap<Chain, ChainState>>,
}

impl WalletStore {
    /// Build a store with Bitcoin wired to the given service. Other
    /// chains report unsupported until their services exist.
    pub fn new(bitcoin: Arc<dyn ChainService>) -> Self {
        let mut services: HashMap<Chain, Arc<dyn ChainService>> = HashMap::new();
        services.insert(Chain::Bitcoin, bitcoin);
        services.insert(Chain::Stacks, Arc::new(UnsupportedChain(Chain::Stacks)));
        services.insert(Chain::Solana, Arc::new(UnsupportedChain(Chain::Solana)));
        Self {
            services,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of a chain's state.
    pub fn state(&self, chain: Chain) -> ChainState {
        self.states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&chain)
            .cloned()
            .unwrap_or_default()
    }

    fn update(&self, chain: Chain, apply: impl FnOnce(&mut ChainState)) {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(states.entry(chain).or_default());
    }

    fn service(&self, chain: Chain) -> Arc<dyn ChainService> {
        // Every chain is registered in the constructor.
        self.services[&chain].clone()
    }

    /// Connect the chain's wallet and populate address and balance.
    pub async fn connect(&self, chain: Chain) {
        self.update(chain, |state| {
            state.is_loading = true;
            state.error = None;
        });

        let service = self.service(chain);
        match service.connect().await {
            Ok(connection) => {
                self.update(chain, |state| {
                    state.is_connected = true;
                    state.address = Some(connection.address.clone());
                    state.is_loading = false;
                });
                // Balance is best-effort: the session is up either way.
                match service.get_balance().await {
                    Ok(balance) => self.update(chain, |state| state.balance = Some(balance)),
                    Err(err) => {
                        tracing::warn!(%chain, %err, "balance fetch after connect failed");
                    }
                }
            }
            Err(err) => {
                tracing::error!(%chain, %err, "wallet connect failed");
                self.update(chain, |state| {
                    state.is_connected = false;
                    state.address = None;
                    state.is_loading = false;
                    state.error = Some(err.to_string());
                });
            }
        }
    }

    /// Disconnect the chain's wallet and reset its state.
    pub async fn disconnect(&self, chain: Chain) {
        self.service(chain).disconnect().await;
        self.update(chain, |state| *state = ChainState::default());
    }

    /// Re-fetch the balance for a connected chain.
    pub async fn refresh_balance(&self, chain: Chain) {
        if !self.state(chain).is_connected {
            return;
        }
        self.update(chain, |state| state.is_loading = true);
        let result = self.service(chain).get_balance().await;
        self.update(chain, |state| {
            state.is_loading = false;
            match &result {
                Ok(balance) => state.balance = Some(balance.clone()),
                Err(err) => state.error = Some(err.to_string()),
            }
        });
    }

    /// Send a transfer on the chain and refresh the balance after.
    /// The loading flag is reset before an error propagates.
    pub async fn send_transfer(
        &self,
        chain: Chain,
        recipient: &str,
        amount_sats: u64,
    ) -> Result<String, ServiceError> {
        self.update(chain, |state| state.is_loading = true);
        let result = self
            .service(chain)
            .send_transfer(recipient, amount_sats)
            .await;
        self.update(chain, |state| state.is_loading = false);

        let txid = result?;
        self.refresh_balance(chain).await;
        Ok(txid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
