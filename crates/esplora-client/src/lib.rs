//! HTTP client for the Esplora-style block-data API.
//!
//! This crate is **transport only** -- it knows how to fetch address
//! stats, UTXO sets, and raw transactions from a public block explorer
//! and how to broadcast a signed transaction, but has no knowledge of
//! wallets or providers. The `wallet` crate bridges it into its
//! `ChainSource` trait.
//!
//! # Endpoints
//!
//! | Method | Path | Returns |
//! |--------|------|---------|
//! | GET | `/address/{addr}` | funded/spent satoshi sums |
//! | GET | `/address/{addr}/utxo` | unspent outputs |
//! | GET | `/tx/{txid}/hex` | raw transaction hex |
//! | POST | `/tx` | plain-text transaction id |

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the block-data API.
#[derive(Debug, thiserror::Error)]
pub enum EsploraError {
    /// The HTTP request itself failed (connection, TLS, decode).
    #[error("block-data request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("block-data API error: status={status} body={body}")]
    Status {
        /// HTTP status code of the response.
        status: reqwest::StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Address statistics from `GET /address/{addr}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressStats {
    /// Confirmed chain statistics.
    pub chain_stats: ChainStats,
}

/// Funded/spent output sums for an address.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainStats {
    /// Total satoshis ever received by the address.
    pub funded_txo_sum: u64,
    /// Total satoshis ever spent from the address.
    pub spent_txo_sum: u64,
}

impl AddressStats {
    /// Confirmed balance in satoshis: funded minus spent.
    pub fn balance_sats(&self) -> u64 {
        self.chain_stats
            .funded_txo_sum
            .saturating_sub(self.chain_stats.spent_txo_sum)
    }
}

/// An unspent transaction output from `GET /address/{addr}/utxo`.
///
/// Ephemeral: fetched fresh for every send and never cached, so input
/// selection always reflects current chain state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Utxo {
    /// Funding transaction id (hex, as returned by the API).
    pub txid: String,
    /// Output index within the funding transaction.
    pub vout: u32,
    /// Output value in satoshis.
    pub value: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Block-data API client.
///
/// Cheap to clone; the inner [`reqwest::Client`] is connection-pooled.
#[derive(Debug, Clone)]
pub struct EsploraClient {
    base_url: String,
    http: reqwest::Client,
}

impl EsploraClient {
    /// Creates a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Creates a client from a [`config::NetworkConfig`].
    pub fn from_config(config: &config::NetworkConfig) -> Self {
        Self::new(config.esplora_url)
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch funded/spent sums for an address.
    pub async fn address_stats(&self, address: &str) -> Result<AddressStats, EsploraError> {
        let url = format!("{}/address/{}", self.base_url, address);
        tracing::debug!(%url, "esplora address_stats");

        let resp = check_status(self.http.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Fetch the unspent outputs for an address, in API order.
    pub async fn utxos(&self, address: &str) -> Result<Vec<Utxo>, EsploraError> {
        let url = format!("{}/address/{}/utxo", self.base_url, address);
        tracing::debug!(%url, "esplora utxos");

        let resp = check_status(self.http.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Fetch a raw transaction as consensus-encoded hex.
    pub async fn tx_hex(&self, txid: &str) -> Result<String, EsploraError> {
        let url = format!("{}/tx/{}/hex", self.base_url, txid);
        tracing::debug!(%url, "esplora tx_hex");

        let resp = check_status(self.http.get(&url).send().await?).await?;
        Ok(resp.text().await?.trim().to_owned())
    }

    /// Broadcast a signed transaction.
    ///
    /// The body is the hex encoding of `raw_tx`; the response body is
    /// the transaction id, returned verbatim as an opaque string.
    pub async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, EsploraError> {
        let url = format!("{}/tx", self.base_url);
        tracing::debug!(%url, bytes = raw_tx.len(), "esplora broadcast");

        let resp = self
            .http
            .post(&url)
            .body(hex::encode(raw_tx))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.text().await?.trim().to_owned())
    }
}

/// Turn a non-success response into [`EsploraError::Status`], keeping
/// the body text for diagnostics.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, EsploraError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::error!(%status, body, "esplora error response");
    Err(EsploraError::Status { status, body })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
