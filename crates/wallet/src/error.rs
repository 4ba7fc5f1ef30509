//! Wallet provider error taxonomy.
//!
//! [`WalletError`] is the unified error type for all provider
//! operations. Variants carry a payload only where a message must
//! survive the trip to the UI (relay errors, broadcast bodies,
//! transport details); everything else is a plain discriminant.
//!
//! Display text for user-facing variants matches the strings the
//! dashboard surfaces in notifications, so upper layers can wrap with
//! context while preserving the original message verbatim.

use std::fmt;

// ---------------------------------------------------------------------------
// WalletError
// ---------------------------------------------------------------------------

/// Errors from wallet provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// No compatible wallet was detected for this provider.
    Unavailable(&'static str),

    /// The wallet returned an empty account list.
    NoAccounts,

    /// Connected, but no spendable payment-purpose address exists.
    NoPaymentAddress,

    /// The user explicitly cancelled the request.
    UserRejected,

    /// An operation was attempted before `connect`.
    NotConnected,

    /// Pre-flight address validation failed.
    InvalidAddress,

    /// Pre-flight amount validation failed.
    InvalidAmount,

    /// Inputs cannot cover the requested amount plus fee.
    InsufficientFunds,

    /// The sender's address has no unspent outputs.
    NoUnspentOutputs,

    /// The wallet failed to produce a signature.
    SigningFailed(String),

    /// The broadcast endpoint did not accept the transaction.
    BroadcastFailed(String),

    /// Generic transport failure from an HTTP call.
    Network(String),

    /// The relay protocol returned its own error message.
    Relay(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(name) => write!(f, "{name} wallet not available"),
            Self::NoAccounts => write!(f, "No accounts returned"),
            Self::NoPaymentAddress => write!(f, "No payment address found"),
            Self::UserRejected => write!(f, "Request rejected by user"),
            Self::NotConnected => write!(f, "Wallet not connected"),
            Self::InvalidAddress => write!(f, "Invalid Bitcoin address format"),
            Self::InvalidAmount => write!(f, "Invalid amount"),
            Self::InsufficientFunds => write!(f, "Insufficient funds including fee"),
            Self::NoUnspentOutputs => write!(f, "No UTXOs available"),
            Self::SigningFailed(reason) => write!(f, "Signing failed: {reason}"),
            Self::BroadcastFailed(reason) => {
                write!(f, "Failed to broadcast transaction: {reason}")
            }
            Self::Network(reason) => write!(f, "Network error: {reason}"),
            // The relay's own message, surfaced verbatim.
            Self::Relay(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for WalletError {}

impl From<esplora_client::EsploraError> for WalletError {
    fn from(err: esplora_client::EsploraError) -> Self {
        Self::Network(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
