//! Protocol-level constants for the Bitcoin transfer pipeline.

/// Dust threshold in satoshis.
///
/// Change below this value is not worth an output: it would cost more
/// to spend than it carries, so the excess is absorbed into the fee
/// instead of producing a change output.
pub const DUST_THRESHOLD_SATS: u64 = 546;

/// Default flat transaction fee in satoshis.
///
/// A deliberate simplification: the fee does not scale with
/// transaction size or network congestion. Used by the default
/// `FixedFee` estimator; replace the estimator to change fee behavior.
pub const DEFAULT_FEE_SATS: u64 = 500;
