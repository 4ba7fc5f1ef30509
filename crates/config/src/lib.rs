//! Static per-network configuration for the dashboard wallet.
//!
//! This crate provides compile-time constant configuration:
//!
//! - [`NetworkConfig`] -- block-data API endpoints for a given network
//! - [`constants`] -- protocol parameters (dust threshold, default fee)
//!
//! All data is `&'static str` and scalars; types are `Copy`. `config`
//! depends only on [`wallet_core::Network`] -- no transport or runtime
//! crates -- so it can be used freely as a leaf dependency.

pub mod constants;

use wallet_core::Network;

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

/// Network-specific configuration for the block-data HTTP API.
///
/// The API is an Esplora-style block explorer: address stats, UTXO
/// listing, raw transaction fetch, and broadcast all hang off one base
/// URL.
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    /// The network this configuration is for.
    pub network: Network,

    /// Base URL of the block-data API, without a trailing slash.
    pub esplora_url: &'static str,
}

impl NetworkConfig {
    /// Get the configuration for a specific network.
    pub const fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::MAINNET,
            Network::Testnet => Self::TESTNET,
        }
    }

    /// Production mainnet configuration.
    pub const MAINNET: Self = Self {
        network: Network::Mainnet,
        esplora_url: "https://blockstream.info/api",
    };

    /// Testnet configuration.
    pub const TESTNET: Self = Self {
        network: Network::Testnet,
        esplora_url: "https://blockstream.info/testnet/api",
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
