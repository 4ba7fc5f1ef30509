//! Host-injected wallet bridges.
//!
//! Browser wallets expose themselves through globals the page probes at
//! runtime. In this crate the embedding host (webview shell, test
//! harness) plays that role: it hands the wallet layer a
//! [`WalletEnvironment`] whose probe methods mirror feature detection.
//! A `Some` from [`WalletEnvironment::phantom`] means the host found an
//! injected handle that identifies itself as Phantom; the relay bridge
//! is always present because the relay protocol needs no injection.
//!
//! Each bridge trait is the minimal surface its provider drives:
//!
//! | Bridge | Shape |
//! |--------|-------|
//! | [`PhantomBridge`] | typed account/sign calls |
//! | [`LeatherBridge`] | `request(method, params)` JSON envelope |
//! | [`SatsConnectBridge`] | relay request with status envelope |

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// What an account's address is intended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountPurpose {
    /// Spendable payment address.
    Payment,
    /// Ordinals/inscription address. Never spent from here.
    Ordinals,
    /// Anything the wallet reports that we do not recognize.
    #[serde(other)]
    Unknown,
}

/// An account as reported by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// The account's Bitcoin address.
    pub address: String,
    /// Declared purpose of the address.
    pub purpose: AccountPurpose,
}

/// Pick the payment-purpose account from a wallet's account list.
///
/// Wallets report payment and ordinals addresses side by side; only the
/// payment address is ever used for balance lookups and spending.
pub fn find_payment_account(accounts: &[Account]) -> Option<&Account> {
    accounts
        .iter()
        .find(|account| account.purpose == AccountPurpose::Payment)
}

// ---------------------------------------------------------------------------
// Bridge error
// ---------------------------------------------------------------------------

/// Errors a bridge call can produce.
///
/// Bridges distinguish only user cancellation from everything else;
/// providers map `Other` into the right [`WalletError`] variant for the
/// operation that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The user dismissed or declined the wallet prompt.
    Rejected,
    /// Any other failure, with the wallet's own message.
    Other(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "request rejected by user"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for BridgeError {}

// ---------------------------------------------------------------------------
// Phantom
// ---------------------------------------------------------------------------

/// Inputs a PSBT signer should sign, grouped by controlling address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputsToSign {
    /// Address that controls the inputs.
    pub address: String,
    /// Indexes into the PSBT's input list.
    pub signing_indexes: Vec<u32>,
}

/// Handle to an injected Phantom wallet.
///
/// Phantom signs but never broadcasts; the provider fetches UTXOs,
/// builds the PSBT, and broadcasts the signed result itself.
#[async_trait]
pub trait PhantomBridge: Send + Sync {
    /// Request the wallet's Bitcoin accounts, prompting if needed.
    async fn request_accounts(&self) -> Result<Vec<Account>, BridgeError>;

    /// Sign an arbitrary message with the key behind `address`.
    async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>, BridgeError>;

    /// Sign the given serialized PSBT and return the fully signed,
    /// finalized transaction in consensus encoding.
    async fn sign_psbt(
        &self,
        psbt: &[u8],
        inputs_to_sign: &[InputsToSign],
    ) -> Result<Vec<u8>, BridgeError>;
}

// ---------------------------------------------------------------------------
// Leather
// ---------------------------------------------------------------------------

/// Handle to an injected Leather wallet.
///
/// Leather speaks a single `request(method, params)` envelope and
/// returns the response's `result` object. Unlike Phantom it handles
/// the whole transfer internally via `sendTransfer`.
#[async_trait]
pub trait LeatherBridge: Send + Sync {
    /// Issue a request and return the unwrapped `result` value.
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, BridgeError>;
}

// ---------------------------------------------------------------------------
// Sats Connect relay
// ---------------------------------------------------------------------------

/// A relay response: either a result or the relay's own error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RelayResponse {
    /// The request succeeded.
    Success {
        /// Method-specific result payload.
        result: serde_json::Value,
    },
    /// The relay reported a failure.
    Error {
        /// The relay's error payload.
        error: RelayError,
    },
}

/// Error payload inside a failed relay response.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayError {
    /// Human-readable message from the relay.
    pub message: String,
}

impl RelayResponse {
    /// Unwrap into the result payload, surfacing the relay's message
    /// verbatim on failure.
    pub fn into_result(self) -> Result<serde_json::Value, WalletError> {
        match self {
            Self::Success { result } => Ok(result),
            Self::Error { error } => Err(WalletError::Relay(error.message)),
        }
    }
}

/// Handle to the Sats Connect relay.
///
/// Always reachable: the relay needs no injected global, so probing is
/// not `Option`-shaped. Failures still travel through the response
/// envelope.
#[async_trait]
pub trait SatsConnectBridge: Send + Sync {
    /// Issue a relay request and return its response envelope.
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<RelayResponse, BridgeError>;
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// The host's view of which wallets are reachable.
///
/// Probes are synchronous feature detection and cheap to call; the
/// factory calls them fresh on every `create_wallet` so availability is
/// never cached across connects.
pub trait WalletEnvironment: Send + Sync {
    /// Injected Phantom handle, if the host detected one.
    fn phantom(&self) -> Option<Arc<dyn PhantomBridge>>;

    /// Injected Leather handle, if the host detected one.
    fn leather(&self) -> Option<Arc<dyn LeatherBridge>>;

    /// The relay bridge. Always present.
    fn sats_connect(&self) -> Arc<dyn SatsConnectBridge>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
