//! Bitcoin address format validation.
//!
//! Format-level validation only: prefix, length, and character set.
//! Checksum verification is left to the wallet that ultimately signs --
//! this check exists so obviously malformed input is rejected at the
//! form boundary without a network round trip.

/// Characters excluded from base-58: visually ambiguous `0 O I l`.
fn is_base58_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l')
}

/// Validate a Bitcoin address format.
///
/// Accepts legacy (`1...`), script (`3...`), and segwit (`bc1...`)
/// addresses with 25-39 characters after the prefix. Legacy and script
/// bodies must be base-58 safe (no `0 O I l`); the segwit body is
/// alphanumeric (its charset permits `0` and `l`).
///
/// Returns `false` for anything malformed -- never errors. The caller
/// decides whether an invalid address is a failure.
pub fn is_valid_bitcoin_address(address: &str) -> bool {
    let (body, base58) = if let Some(rest) = address.strip_prefix("bc1") {
        (rest, false)
    } else if address.starts_with('1') || address.starts_with('3') {
        (&address[1..], true)
    } else {
        return false;
    };

    if body.len() < 25 || body.len() > 39 {
        return false;
    }

    if base58 {
        body.bytes().all(is_base58_char)
    } else {
        body.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
