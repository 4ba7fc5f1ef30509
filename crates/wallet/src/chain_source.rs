//! Chain data access for providers that build their own transactions.
//!
//! [`ChainSource`] abstracts the block-data API behind the error
//! vocabulary of this crate, so providers and tests never touch HTTP
//! types directly. The production implementation is
//! [`esplora_client::EsploraClient`].

use async_trait::async_trait;

use esplora_client::{EsploraClient, EsploraError};

use crate::error::WalletError;

pub use esplora_client::Utxo;

/// Read and broadcast access to the Bitcoin chain.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Confirmed balance of an address in satoshis.
    async fn balance_sats(&self, address: &str) -> Result<u64, WalletError>;

    /// Unspent outputs of an address, in source order.
    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, WalletError>;

    /// Raw transaction hex for a txid.
    async fn tx_hex(&self, txid: &str) -> Result<String, WalletError>;

    /// Broadcast a consensus-encoded signed transaction; returns the
    /// transaction id as reported by the endpoint.
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, WalletError>;
}

#[async_trait]
impl ChainSource for EsploraClient {
    async fn balance_sats(&self, address: &str) -> Result<u64, WalletError> {
        let stats = self.address_stats(address).await?;
        Ok(stats.balance_sats())
    }

    async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, WalletError> {
        Ok(EsploraClient::utxos(self, address).await?)
    }

    async fn tx_hex(&self, txid: &str) -> Result<String, WalletError> {
        Ok(EsploraClient::tx_hex(self, txid).await?)
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, WalletError> {
        // A rejection at broadcast is its own failure class; keep the
        // endpoint's body so the reason (mempool policy, double spend)
        // reaches the logs.
        EsploraClient::broadcast(self, raw_tx)
            .await
            .map_err(|err| match err {
                EsploraError::Status { body, .. } => WalletError::BroadcastFailed(body),
                other => WalletError::Network(other.to_string()),
            })
    }
}
