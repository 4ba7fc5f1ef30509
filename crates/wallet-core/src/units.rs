//! Satoshi/BTC unit arithmetic.
//!
//! All balances and transfer amounts are carried internally as integer
//! satoshis (u64). BTC decimal strings only exist at the UI boundary:
//! [`to_satoshis`] converts user input in, [`format_btc`] converts
//! balances out. Both work digit-wise on the string so no float ever
//! touches an amount.

use std::fmt;

/// Satoshis per BTC (10^8).
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Number of BTC decimal places.
const BTC_DECIMALS: usize = 8;

/// Minimum transferable amount in satoshis.
///
/// Outputs below the network's economic dust threshold are likely to be
/// rejected or unspendable, so amounts under this floor are refused
/// before any network round trip.
pub const MIN_TRANSFER_SATS: u64 = 1_500;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from parsing a BTC amount string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    /// The input is not a decimal number.
    Invalid,

    /// The parsed amount is zero or negative.
    NotPositive,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid amount"),
            Self::NotPositive => write!(f, "amount must be positive"),
        }
    }
}

impl std::error::Error for AmountError {}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Parse a decimal BTC string into satoshis, flooring.
///
/// Fractional digits past the eighth are truncated, never rounded up,
/// so the resulting request can never exceed what the user authorized:
/// `"0.000000015"` parses to 1 sat, not 2.
///
/// # Errors
///
/// [`AmountError::Invalid`] for non-numeric input;
/// [`AmountError::NotPositive`] when the amount floors to zero or is
/// negative.
pub fn to_satoshis(amount: &str) -> Result<u64, AmountError> {
    let text = amount.trim();

    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };

    // At least one digit somewhere, and nothing but digits anywhere.
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountError::Invalid);
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AmountError::Invalid);
    }

    if negative {
        return Err(AmountError::NotPositive);
    }

    let whole: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| AmountError::Invalid)?
    };

    // Truncating past eight fractional digits is the floor.
    let frac_digits = &frac_part[..frac_part.len().min(BTC_DECIMALS)];
    let mut frac: u64 = 0;
    for b in frac_digits.bytes() {
        frac = frac * 10 + u64::from(b - b'0');
    }
    frac *= 10u64.pow((BTC_DECIMALS - frac_digits.len()) as u32);

    let sats = whole
        .checked_mul(SATS_PER_BTC)
        .and_then(|w| w.checked_add(frac))
        .ok_or(AmountError::Invalid)?;

    if sats == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(sats)
}

/// Whether a satoshi amount meets the transfer minimum.
pub fn is_above_minimum(amount_sats: u64) -> bool {
    amount_sats >= MIN_TRANSFER_SATS
}

/// Format satoshis as a decimal BTC string.
///
/// Trailing fractional zeros are trimmed and a whole number carries no
/// decimal point: 100_000_000 sats formats as `"1"`, not `"1.00000000"`.
/// Always derived from the integer satoshi value; never stored.
pub fn format_btc(sats: u64) -> String {
    let whole = sats / SATS_PER_BTC;
    let frac = sats % SATS_PER_BTC;

    if frac == 0 {
        return whole.to_string();
    }

    let mut frac_str = format!("{frac:08}");
    while frac_str.ends_with('0') {
        frac_str.pop();
    }
    format!("{whole}.{frac_str}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_btc() {
        assert_eq!(to_satoshis("1"), Ok(100_000_000));
        assert_eq!(to_satoshis("21"), Ok(2_100_000_000));
    }

    #[test]
    fn parses_fractional_btc() {
        assert_eq!(to_satoshis("0.001"), Ok(100_000));
        assert_eq!(to_satoshis("0.00001499"), Ok(1_499));
        assert_eq!(to_satoshis(".5"), Ok(50_000_000));
        assert_eq!(to_satoshis("1.5"), Ok(150_000_000));
    }

    #[test]
    fn floors_past_eight_decimals() {
        // 1.5 sats floors to 1, never rounds to 2.
        assert_eq!(to_satoshis("0.000000015"), Ok(1));
        assert_eq!(to_satoshis("0.000000019999"), Ok(1));
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(to_satoshis("0"), Err(AmountError::NotPositive));
        assert_eq!(to_satoshis("0.000000001"), Err(AmountError::NotPositive));
        assert_eq!(to_satoshis("-0.001"), Err(AmountError::NotPositive));
    }

    #[test]
    fn rejects_non_numeric() {
        assert_eq!(to_satoshis(""), Err(AmountError::Invalid));
        assert_eq!(to_satoshis("abc"), Err(AmountError::Invalid));
        assert_eq!(to_satoshis("1.2.3"), Err(AmountError::Invalid));
        assert_eq!(to_satoshis("1e8"), Err(AmountError::Invalid));
        assert_eq!(to_satoshis("."), Err(AmountError::Invalid));
        assert_eq!(to_satoshis("-"), Err(AmountError::Invalid));
    }

    #[test]
    fn minimum_boundary() {
        assert!(!is_above_minimum(1_499));
        assert!(is_above_minimum(1_500));
        assert!(is_above_minimum(1_501));
    }

    #[test]
    fn formats_whole_values_without_decimals() {
        assert_eq!(format_btc(0), "0");
        assert_eq!(format_btc(100_000_000), "1");
        assert_eq!(format_btc(200_000_000), "2");
    }

    #[test]
    fn formats_fractions_trimmed() {
        assert_eq!(format_btc(150_000_000), "1.5");
        assert_eq!(format_btc(100_000), "0.001");
        assert_eq!(format_btc(1_499), "0.00001499");
        assert_eq!(format_btc(1), "0.00000001");
    }

    #[test]
    fn parse_format_round_trip() {
        for sats in [1, 546, 1_500, 100_000, 99_999_999, 100_000_001] {
            assert_eq!(to_satoshis(&format_btc(sats)), Ok(sats));
        }
    }
}
