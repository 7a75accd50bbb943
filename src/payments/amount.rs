//! Human decimal amounts to token smallest units and back.
//!
//! Always scaled by the token's decimals (6 for USDC), never by the native
//! asset's 18.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::U256;

use crate::error::{Error, Result};

/// Parse a positive decimal string such as `"10"` or `"0.25"` into smallest units.
pub fn to_smallest_unit(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(Error::Validation("Amount is required".to_string()));
    }
    if amount.starts_with('-') {
        return Err(Error::Validation("Amount must be greater than 0".to_string()));
    }
    let well_formed = amount.chars().all(|c| c.is_ascii_digit() || c == '.')
        && amount.matches('.').count() <= 1
        && amount.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(Error::Validation(format!("Invalid amount '{amount}'")));
    }
    if let Some((_, fraction)) = amount.split_once('.') {
        if fraction.len() > usize::from(decimals) {
            return Err(Error::Validation(format!(
                "Amount supports at most {decimals} decimal places"
            )));
        }
    }

    let value = match parse_units(amount, decimals) {
        Ok(ParseUnits::U256(value)) => value,
        Ok(ParseUnits::I256(_)) => {
            return Err(Error::Validation("Amount must be greater than 0".to_string()))
        }
        Err(e) => return Err(Error::Validation(format!("Invalid amount '{amount}': {e}"))),
    };

    if value.is_zero() {
        return Err(Error::Validation("Amount must be greater than 0".to_string()));
    }
    Ok(value)
}

/// Render smallest units as a decimal string.
pub fn format_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}
