//! Wallet provider selection.
//!
//! The factory probes the environment in a fixed priority order and
//! returns the first match:
//!
//! 1. Phantom, when its injected handle is present
//! 2. Leather, when its injected handle is present
//! 3. the Sats Connect relay, unconditionally
//!
//! The fallback means `create_wallet` always yields a provider; whether
//! the relay can actually reach a wallet surfaces later, at `connect`.
//! Probing is repeated on every call so availability reflects the
//! current environment, never a cached one.

use std::sync::Arc;

use wallet_core::Network;

use crate::bridge::WalletEnvironment;
use crate::builder::FeeEstimator;
use crate::chain_source::ChainSource;
use crate::provider::WalletProvider;
use crate::providers::{LeatherProvider, PhantomProvider, SatsConnectProvider};

/// Select and construct a provider for the current environment.
pub fn create_wallet(
    env: Arc<dyn WalletEnvironment>,
    chain: Arc<dyn ChainSource>,
    fees: Arc<dyn FeeEstimator>,
    network: Network,
) -> Box<dyn WalletProvider> {
    if env.phantom().is_some() {
        tracing::debug!("selected phantom provider");
        return Box::new(PhantomProvider::new(env, chain, fees, network));
    }
    if env.leather().is_some() {
        tracing::debug!("selected leather provider");
        return Box::new(LeatherProvider::new(env, chain));
    }
    tracing::debug!("selected sats-connect relay provider");
    Box::new(SatsConnectProvider::new(env.sats_connect()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
