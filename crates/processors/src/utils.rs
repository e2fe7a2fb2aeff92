//! Shared parsing helpers for the stream processors.

use rust_decimal::Decimal;

use tally_core::error::{DomainError, DomainResult};

/// Destination address that signifies token destruction.
pub const BURN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Extract the network id from a composite upstream event id.
///
/// Upstream ids are `"<network>-<sequence>"`, e.g. `"10-5"` for the fifth
/// event on chain 10.
pub fn network_id_from_event_id(id: &str) -> DomainResult<u64> {
    id.split('-')
        .next()
        .and_then(|part| part.parse().ok())
        .ok_or_else(|| DomainError::InvalidEventId(id.to_string()))
}

/// Parse a token or deposit id field.
pub fn parse_token_id(raw: &str) -> DomainResult<u64> {
    raw.parse()
        .map_err(|_| DomainError::InvalidTokenId(raw.to_string()))
}

/// Whether a transfer destination is the burn sentinel.
pub fn is_burn(to: &str) -> bool {
    to.eq_ignore_ascii_case(BURN_ADDRESS)
}

/// Decimal places of the stablecoin on a network.
///
/// USDC uses 6 decimals everywhere except the BSC variants (18).
pub fn stablecoin_decimals(network_id: u64) -> u32 {
    match network_id {
        56 | 97 => 18,
        _ => 6,
    }
}

/// Convert a raw integer amount string into whole units as an exact decimal.
///
/// `"1000000"` at 6 decimals becomes exactly `1`; no float ever enters the
/// conversion.
pub fn scaled_amount(raw: &str, decimals: u32) -> DomainResult<Decimal> {
    let units: i128 = raw
        .parse()
        .map_err(|_| DomainError::InvalidAmount(raw.to_string()))?;
    Decimal::try_from_i128_with_scale(units, decimals)
        .map_err(|_| DomainError::InvalidAmount(raw.to_string()))
}
