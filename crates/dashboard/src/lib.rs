//! Dashboard-facing wallet layer.
//!
//! Everything the UI shell talks to lives here:
//!
//! - [`BitcoinService`] -- facade over the provider layer; owns
//!   provider selection and the connected session
//! - [`WalletStore`] -- per-chain connection state
//! - [`TransferForm`] -- the send-Bitcoin form state machine
//!
//! The UI never sees a provider, a bridge, or a chain source; those
//! stay behind the `wallet` crate and the [`ChainService`] trait.

pub mod error;
pub mod form;
pub mod service;
pub mod store;

pub use error::ServiceError;
pub use form::{FormPhase, Notifier, TransferForm};
pub use service::{BitcoinService, ChainService};
pub use store::{ChainState, WalletStore};
