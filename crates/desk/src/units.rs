//! Conversion between on-chain fixed-point integers and human decimal amounts.
//!
//! Both directions are exact: the integer is never pushed through a float.

use std::fmt;

use alloy_primitives::{U256, utils::format_units};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

/// CRX uses 18 decimals.
pub const CRX_DECIMALS: u8 = 18;
/// The stablecoin offers are priced in uses 6 decimals.
pub const USDC_DECIMALS: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("negative amounts are not allowed: `{0}`")]
    Negative(String),
    #[error("`{input}` has more than {decimals} decimal places")]
    ExcessPrecision { input: String, decimals: u8 },
    #[error("`{0}` is too large")]
    Overflow(String),
    #[error("`{0}` is not a decimal number")]
    Invalid(String),
}

/// Formats `raw` as a decimal string with `decimals` fractional digits,
/// dropping trailing zeros.
pub fn to_human(raw: U256, decimals: u8) -> String {
    // format_units only fails for more than 77 decimals
    let formatted = format_units(raw, decimals).unwrap_or_else(|_| raw.to_string());
    trim_fraction(formatted)
}

/// Parses a human decimal string into its integer representation.
///
/// Inputs with more fractional digits than `decimals`, negative inputs and
/// values that do not fit in 256 bits are rejected.
pub fn to_raw(human: &str, decimals: u8) -> Result<U256, UnitsError> {
    let input = human.trim();
    if input.is_empty() {
        return Err(UnitsError::Empty);
    }
    if input.starts_with('-') {
        return Err(UnitsError::Negative(input.to_string()));
    }

    let (int_part, frac_part) = input.split_once('.').unwrap_or((input, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(int_part) || !is_digits(frac_part) || (int_part.is_empty() && frac_part.is_empty())
    {
        return Err(UnitsError::Invalid(input.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(UnitsError::ExcessPrecision {
            input: input.to_string(),
            decimals,
        });
    }

    let digits = format!("{int_part}{frac_part:0<width$}", width = decimals as usize);
    U256::from_str_radix(&digits, 10).map_err(|_| UnitsError::Overflow(input.to_string()))
}

fn trim_fraction(mut formatted: String) -> String {
    if formatted.contains('.') {
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed);
    }
    formatted
}

/// An on-chain amount together with the decimals of its asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    pub const fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub const fn crx(raw: U256) -> Self {
        Self::new(raw, CRX_DECIMALS)
    }

    pub const fn usdc(raw: U256) -> Self {
        Self::new(raw, USDC_DECIMALS)
    }

    pub const fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    /// Parses a human amount, see [`to_raw`].
    pub fn parse(human: &str, decimals: u8) -> Result<Self, UnitsError> {
        to_raw(human, decimals).map(|raw| Self::new(raw, decimals))
    }

    pub const fn raw(&self) -> U256 {
        self.raw
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// `self - other`, floored at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        debug_assert_eq!(self.decimals, other.decimals);
        Self::new(self.raw.saturating_sub(other.raw), self.decimals)
    }

    /// The amount as a [`Decimal`] for input arithmetic.
    ///
    /// Returns `None` if it exceeds the 96-bit mantissa of a `Decimal`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.raw).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, self.decimals as u32)
            .ok()
            .map(|d| d.normalize())
    }

    /// Converts a decimal into an on-chain amount, truncating digits beyond
    /// `decimals`.
    pub fn from_decimal(value: Decimal, decimals: u8) -> Result<Self, UnitsError> {
        if value.is_zero() {
            return Ok(Self::zero(decimals));
        }
        if value.is_sign_negative() {
            return Err(UnitsError::Negative(value.to_string()));
        }
        let truncated = value.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
        Self::parse(&truncated.to_string(), decimals)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_human(self.raw, self.decimals))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
