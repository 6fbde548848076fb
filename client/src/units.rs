//! Conversions between human-scale values and raw on-wire integers.
//!
//! Token amounts travel scaled by the mint's decimal count. Percentage-like
//! rates (the APYs and the early-withdrawal fee) travel with one fractional
//! digit, scaled by ten. Fee basis points are already integral and are
//! encoded as-is.

use crate::error::StakingClientError;

/// Wire scale for percentage-like rates: one fractional digit survives.
pub const RATE_SCALE: f64 = 10.0;

/// Scales a whole-token amount by `10^decimals` for encoding.
pub fn scale_token_amount(
    label: &'static str,
    amount: f64,
    decimals: u8,
) -> Result<u64, StakingClientError> {
    scale(label, amount, 10f64.powi(decimals as i32))
}

/// Scales a percentage-like rate for encoding: `50.0` becomes `500`.
pub fn scale_rate(label: &'static str, rate: f64) -> Result<u64, StakingClientError> {
    scale(label, rate, RATE_SCALE)
}

fn scale(label: &'static str, value: f64, factor: f64) -> Result<u64, StakingClientError> {
    if !value.is_finite() || value < 0.0 {
        return Err(StakingClientError::ValueOutOfRange { label, value });
    }
    let scaled = (value * factor).round();
    if scaled >= u64::MAX as f64 {
        return Err(StakingClientError::ValueOutOfRange { label, value });
    }
    Ok(scaled as u64)
}

/// Inverse of [`scale_token_amount`], for displaying decoded state.
pub fn ui_token_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Inverse of [`scale_rate`].
pub fn ui_rate(raw: u64) -> f64 {
    raw as f64 / RATE_SCALE
}
