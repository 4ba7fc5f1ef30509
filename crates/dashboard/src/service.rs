//! The Bitcoin service facade.
//!
//! [`BitcoinService`] is the one entry point the dashboard uses for
//! Bitcoin: it owns provider selection (via the factory), the connected
//! provider's lifetime, and error wrapping. Callers never hold a
//! provider directly.
//!
//! Connect is single-flight: a second connect while one is still
//! running fails with [`ServiceError::ConnectInFlight`] instead of
//! racing two wallet prompts. Disconnect is unconditional and
//! idempotent.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use esplora_client::EsploraClient;
use wallet::{
    create_wallet, ChainSource, FeeEstimator, FixedFee, WalletConnection, WalletEnvironment,
    WalletError, WalletProvider,
};
use wallet_core::Network;

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// ChainService
// ---------------------------------------------------------------------------

/// What the store needs from a per-chain wallet service.
#[async_trait]
pub trait ChainService: Send + Sync {
    /// Connect and return the wallet's address.
    async fn connect(&self) -> Result<WalletConnection, ServiceError>;

    /// Formatted balance of the connected wallet.
    async fn get_balance(&self) -> Result<String, ServiceError>;

    /// Send a transfer; returns the transaction id.
    async fn send_transfer(&self, recipient: &str, amount_sats: u64)
        -> Result<String, ServiceError>;

    /// Sign a message with the connected wallet.
    async fn sign_message(&self, message: &str, address: &str) -> Result<String, ServiceError>;

    /// Tear down the session. Never fails.
    async fn disconnect(&self);
}

// ---------------------------------------------------------------------------
// BitcoinService
// ---------------------------------------------------------------------------

struct ConnectState {
    provider: Option<Arc<dyn WalletProvider>>,
    connecting: bool,
}

/// Facade over the wallet provider layer.
pub struct BitcoinService {
    env: Arc<dyn WalletEnvironment>,
    chain: Arc<dyn ChainSource>,
    fees: Arc<dyn FeeEstimator>,
    network: Network,
    state: Mutex<ConnectState>,
}

impl BitcoinService {
    /// Build a service with explicit chain access and fee policy.
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
            state: Mutex::new(ConnectState {
                provider: None,
                connecting: false,
            }),
        }
    }

    /// Build a service wired to the public block-data API for the
    /// given network, with the default fee policy.
    pub fn with_defaults(env: Arc<dyn WalletEnvironment>, network: Network) -> Self {
        let config = config::NetworkConfig::for_network(network);
        Self::new(
            env,
            Arc::new(EsploraClient::from_config(&config)),
            Arc::new(FixedFee::default()),
            network,
        )
    }

    /// Select a provider for the current environment and connect it.
    ///
    /// On success the provider is retained for subsequent calls; on
    /// failure no provider is kept, so a retry re-probes from scratch.
    pub async fn connect(&self) -> Result<WalletConnection, ServiceError> {
        {
            let mut state = self.state.lock().await;
            if state.connecting {
                return Err(ServiceError::ConnectInFlight);
            }
            state.connecting = true;
        }

        let provider: Arc<dyn WalletProvider> = Arc::from(create_wallet(
            self.env.clone(),
            self.chain.clone(),
            self.fees.clone(),
            self.network,
        ));
        tracing::debug!(provider = provider.name(), "connecting wallet");
        let result = provider.connect().await;

        let mut state = self.state.lock().await;
        state.connecting = false;
        match result {
            Ok(connection) => {
                tracing::info!(
                    provider = provider.name(),
                    address = %connection.address,
                    "wallet connected"
                );
                state.provider = Some(provider);
                Ok(connection)
            }
            Err(err) => {
                tracing::error!(provider = provider.name(), %err, "wallet connect failed");
                state.provider = None;
                Err(wrap("Failed to connect wallet", err))
            }
        }
    }

    /// Whether a provider is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.provider.is_some()
    }

    pub async fn get_balance(&self) -> Result<String, ServiceError> {
        let provider = self.provider().await?;
        provider
            .get_balance()
            .await
            .map_err(|err| wrap("Failed to get balance", err))
    }

    pub async fn sign_message(&self, message: &str, address: &str) -> Result<String, ServiceError> {
        let provider = self.provider().await?;
        provider
            .sign_message(message, address)
            .await
            .map_err(|err| wrap("Failed to sign message", err))
    }

    pub async fn send_bitcoin(
        &self,
        recipient: &str,
        amount_sats: u64,
    ) -> Result<String, ServiceError> {
        let provider = self.provider().await?;
        provider
            .send_bitcoin(recipient, amount_sats)
            .await
            .map_err(|err| wrap("Failed to send Bitcoin", err))
    }

    /// Drop the connected provider, telling it to tear down first.
    /// Safe to call when nothing is connected.
    pub async fn disconnect(&self) {
        let provider = self.state.lock().await.provider.take();
        if let Some(provider) = provider {
            provider.disconnect().await;
            tracing::info!(provider = provider.name(), "wallet disconnected");
        }
    }

    async fn provider(&self) -> Result<Arc<dyn WalletProvider>, ServiceError> {
        self.state
            .lock()
            .await
            .provider
            .clone()
            .ok_or(ServiceError::NotConnected)
    }
}

#[async_trait]
impl ChainService for BitcoinService {
    async fn connect(&self) -> Result<WalletConnection, ServiceError> {
        BitcoinService::connect(self).await
    }

    async fn get_balance(&self) -> Result<String, ServiceError> {
        BitcoinService::get_balance(self).await
    }

    async fn send_transfer(
        &self,
        recipient: &str,
        amount_sats: u64,
    ) -> Result<String, ServiceError> {
        self.send_bitcoin(recipient, amount_sats).await
    }

    async fn sign_message(&self, message: &str, address: &str) -> Result<String, ServiceError> {
        BitcoinService::sign_message(self, message, address).await
    }

    async fn disconnect(&self) {
        BitcoinService::disconnect(self).await;
    }
}

fn wrap(context: &'static str, source: WalletError) -> ServiceError {
    ServiceError::wallet(context, source)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
