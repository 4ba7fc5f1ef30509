//! Multi-provider Bitcoin wallet abstraction.
//!
//! Three incompatible wallet integrations sit behind one
//! [`WalletProvider`] contract:
//!
//! | Provider | Detection | Transfer path |
//! |----------|-----------|---------------|
//! | Phantom | injected handle | local PSBT pipeline + broadcast |
//! | Leather | injected handle | wallet-native `sendTransfer` |
//! | Sats Connect | always reachable | relay `sendTransfer` |
//!
//! [`create_wallet`] probes the host-supplied [`WalletEnvironment`] in
//! priority order and returns a boxed provider; callers only ever see
//! the trait. Providers that build their own transactions do so through
//! [`ChainSource`] (backed by `esplora-client` in production) and the
//! pure assembly code in [`builder`].

pub mod bridge;
pub mod builder;
pub mod chain_source;
pub mod error;
pub mod factory;
pub mod provider;
pub mod providers;

pub use bridge::{
    Account, AccountPurpose, BridgeError, InputsToSign, LeatherBridge, PhantomBridge,
    RelayError, RelayResponse, SatsConnectBridge, WalletEnvironment,
};
pub use builder::{FeeEstimator, FixedFee, TransferInput, UnsignedTransfer};
pub use chain_source::{ChainSource, Utxo};
pub use error::WalletError;
pub use factory::create_wallet;
pub use provider::{WalletConnection, WalletProvider};
