//! The wallet provider contract.
//!
//! Three mutually incompatible wallet integrations sit behind
//! [`WalletProvider`]; callers never learn which one they got. Balances
//! cross the trait as formatted BTC strings and transaction ids as
//! opaque strings, so the surface stays identical no matter how a
//! provider produces them.

use async_trait::async_trait;

use crate::error::WalletError;

/// Result of a successful `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    /// The wallet's spendable payment address.
    pub address: String,
}

/// A connected (or connectable) Bitcoin wallet.
///
/// All operations except [`connect`](Self::connect) and
/// [`disconnect`](Self::disconnect) require a prior successful connect
/// and fail with [`WalletError::NotConnected`] otherwise.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Short stable identifier for logging.
    fn name(&self) -> &'static str;

    /// Establish a session and return the payment address.
    async fn connect(&self) -> Result<WalletConnection, WalletError>;

    /// Fetch the payment address balance, formatted as a BTC decimal
    /// string with trailing zeros trimmed.
    async fn get_balance(&self) -> Result<String, WalletError>;

    /// Sign a human-readable message; returns an opaque signature
    /// string (encoding is provider-specific).
    async fn sign_message(&self, message: &str, address: &str) -> Result<String, WalletError>;

    /// Send `amount_sats` to `recipient` and return the broadcast
    /// transaction id.
    async fn send_bitcoin(&self, recipient: &str, amount_sats: u64) -> Result<String, WalletError>;

    /// Tear down the session. Infallible and idempotent.
    async fn disconnect(&self);
}
