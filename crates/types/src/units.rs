use alloy_primitives::{I256, U256};

use crate::AmountError;

/// Decimals between wei and eth.
pub const ETH_DECIMALS: usize = 18;

/// Parses a non-negative decimal wei string as stored by the relay data API.
pub fn parse_wei(value: &str) -> Result<U256, AmountError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidWei(value.to_string()));
    }
    U256::from_str_radix(value, 10).map_err(|_| AmountError::OutOfRange(value.to_string()))
}

/// Converts an unsigned amount into the signed domain used for balance differences.
pub fn signed_wei(value: U256) -> Result<I256, AmountError> {
    I256::try_from(value).map_err(|_| AmountError::OutOfRange(value.to_string()))
}

/// Renders a wei amount as eth with up to 18 decimals, trailing zeros trimmed.
///
/// Display only. Verdicts always compare the integer wei amounts.
pub fn format_wei_as_eth(wei: I256) -> String {
    let (sign, abs) = wei.into_sign_and_abs();
    let digits = abs.to_string();

    let (int_part, frac_part) = if digits.len() > ETH_DECIMALS {
        let split = digits.len() - ETH_DECIMALS;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{digits:0>width$}", width = ETH_DECIMALS))
    };

    let mut eth = String::with_capacity(int_part.len() + ETH_DECIMALS + 2);
    if sign.is_negative() && !abs.is_zero() {
        eth.push('-');
    }
    eth.push_str(&int_part);

    let frac_part = frac_part.trim_end_matches('0');
    if !frac_part.is_empty() {
        eth.push('.');
        eth.push_str(frac_part);
    }
    eth
}
