//! Token amount formatting and parsing
//!
//! Amounts are exact: values are kept in base units as `U256` and converted
//! to and from decimal strings without going through floating point.

use crate::error::{bail, ensure, Result};
use alloy::primitives::U256;

/// Ether and most ERC-20 tokens use 18 decimals
pub const ETHER_DECIMALS: u8 = 18;

/// Format a base-unit amount as a decimal string
///
/// Trailing fractional zeros are trimmed but one fractional digit is always
/// kept, so `1e18` with 18 decimals renders as `"1.0"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let decimals = decimals as usize;
    // At least one integer digit
    let digits = format!("{:0>width$}", value.to_string(), width = decimals + 1);
    let (integer, fraction) = digits.split_at(digits.len() - decimals);

    let trimmed = fraction.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{integer}.{fraction}")
}

/// Parse a decimal string into base units
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    ensure!(!amount.is_empty(), "Amount is empty");

    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };

    ensure!(
        !(integer.is_empty() && fraction.is_empty()),
        "Amount has no digits: {}",
        amount
    );
    if !integer.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        bail!("Amount is not a non-negative decimal number: {}", amount);
    }
    ensure!(
        fraction.len() <= decimals as usize,
        "Amount {} has more than {} fractional digits",
        amount,
        decimals
    );

    let digits = format!(
        "{}{:0<width$}",
        if integer.is_empty() { "0" } else { integer },
        fraction,
        width = decimals as usize
    );

    match U256::from_str_radix(&digits, 10) {
        Ok(value) => Ok(value),
        Err(_) => bail!("Amount {} is too large", amount),
    }
}

/// Format an 18-decimal amount
pub fn format_ether(value: U256) -> String {
    format_units(value, ETHER_DECIMALS)
}

/// Parse an 18-decimal amount
pub fn parse_ether(amount: &str) -> Result<U256> {
    parse_units(amount, ETHER_DECIMALS)
}
