//! The three wallet provider implementations.
//!
//! Each provider adapts one wallet's native protocol to the shared
//! [`WalletProvider`](crate::provider::WalletProvider) contract:
//!
//! - [`phantom`] -- injected wallet; full local PSBT pipeline
//! - [`leather`] -- injected wallet; request envelope, native transfer
//! - [`sats_connect`] -- relay wallet; status-envelope protocol

pub mod leather;
pub mod phantom;
pub mod sats_connect;

pub use leather::LeatherProvider;
pub use phantom::PhantomProvider;
pub use sats_connect::SatsConnectProvider;
