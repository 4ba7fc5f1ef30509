//! Core types and utilities for the dashboard wallet.
//!
//! This crate provides the foundational pieces shared by every other
//! crate in the workspace:
//!
//! - [`Chain`] -- which blockchain a connection belongs to
//! - [`Network`] -- Bitcoin network identifier (Mainnet, Testnet)
//! - [`units`] -- exact satoshi/BTC conversions and the transfer minimum
//! - [`address`] -- Bitcoin address format validation
//!
//! No runtime dependencies. All arithmetic is integer-exact; BTC decimal
//! strings are parsed and formatted without going through floats, so the
//! floor guarantee on user-entered amounts holds for every input.

pub mod address;
pub mod units;

pub use address::is_valid_bitcoin_address;
pub use units::{format_btc, is_above_minimum, to_satoshis, AmountError, MIN_TRANSFER_SATS};

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// The blockchains the dashboard can hold a wallet connection for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    /// Bitcoin.
    Bitcoin,

    /// Stacks.
    Stacks,

    /// Solana.
    Solana,
}

impl core::fmt::Display for Chain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bitcoin => write!(f, "bitcoin"),
            Self::Stacks => write!(f, "stacks"),
            Self::Solana => write!(f, "solana"),
        }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Bitcoin network identifier.
///
/// Determines which block-data API base URL is used and which address
/// network transactions are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Bitcoin mainnet.
    Mainnet,

    /// Bitcoin testnet.
    Testnet,
}
