//! Dashboard-facing errors.

use std::fmt;

use wallet::WalletError;
use wallet_core::Chain;

/// Errors surfaced to the dashboard.
///
/// Wallet failures keep their source so logs see the full chain, while
/// `Display` produces the exact "context: message" shape the UI shows.
#[derive(Debug)]
pub enum ServiceError {
    /// A connect was requested while another is still running.
    ConnectInFlight,

    /// An operation needs a connected wallet and none is present.
    NotConnected,

    /// Wallet support for this chain has not been built yet.
    Unsupported(Chain),

    /// A provider operation failed.
    Wallet {
        /// User-facing context, e.g. "Failed to connect wallet".
        context: &'static str,
        /// The underlying provider error.
        source: WalletError,
    },
}

impl ServiceError {
    pub(crate) fn wallet(context: &'static str, source: WalletError) -> Self {
        Self::Wallet { context, source }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectInFlight => write!(f, "Connection already in progress"),
            Self::NotConnected => write!(f, "Wallet not connected"),
            Self::Unsupported(chain) => write!(f, "{chain} wallet support is not implemented"),
            Self::Wallet { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wallet { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
