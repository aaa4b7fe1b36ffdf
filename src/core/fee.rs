//! Network fee floor.
//!
//! Every settled transfer pays at least [`MINIMUM_FEE`], and never less than
//! 0.02% of the time moved (`seconds * multiplier`).

use crate::core::errors::LedgerError;

/// 0.02% expressed as a divisor, so round numbers of seconds divide exactly.
pub const FEE_RATE_DIVISOR: f64 = 5000.0;
pub const MINIMUM_FEE: u64 = 1;

/// `floor(0.0002 * seconds * multiplier)`.
pub fn minimum_fee(seconds: u64, multiplier: f64) -> u64 {
    (seconds as f64 * multiplier / FEE_RATE_DIVISOR).floor() as u64
}

/// The smallest fee [`validate_fee`] accepts.
pub fn required_fee(seconds: u64, multiplier: f64) -> u64 {
    minimum_fee(seconds, multiplier).max(MINIMUM_FEE)
}

pub fn validate_fee(seconds: u64, multiplier: f64, supplied_fee: u64) -> Result<(), LedgerError> {
    let required = required_fee(seconds, multiplier);
    if supplied_fee < required {
        return Err(LedgerError::FeeBelowMinimum {
            supplied: supplied_fee,
            required,
        });
    }
    Ok(())
}
