//! Exact numeric conversions between the hexadecimal quantities the node
//! speaks, human-readable decimal amounts, and 256-bit integers. No amount
//! ever passes through binary floating point; conversions from finer decimal
//! input truncate toward zero.

use {
    crate::domain::eth,
    alloy::primitives::U256,
    bigdecimal::BigDecimal,
    num::{BigInt, BigUint, One, rational::Ratio},
};

/// A 256-bit rational type.
type Rational = num::rational::Ratio<U256>;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("malformed number: {0:?}")]
    MalformedNumber(String),
    #[error("value does not fit the requested width")]
    Overflow,
}

/// Parses a hexadecimal quantity as returned by the node. The `0x` prefix is
/// optional.
pub fn hex_to_u256(raw: &str) -> Result<U256, Error> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    U256::from_str_radix(digits, 16).map_err(|_| Error::MalformedNumber(raw.to_owned()))
}

pub fn hex_to_u64(raw: &str) -> Result<u64, Error> {
    u64::try_from(hex_to_u256(raw)?).map_err(|_| Error::Overflow)
}

/// Scales a decimal amount by `10^decimals` into an integer number of base
/// units, truncating any fractional remainder below the smallest unit. Covers
/// ether amounts, gas prices quoted in coarser denominations, and human token
/// amounts alike.
pub fn parse_scaled(raw: &str, decimals: u32) -> Result<U256, Error> {
    let amount: BigDecimal = raw
        .trim()
        .parse()
        .map_err(|_| Error::MalformedNumber(raw.to_owned()))?;
    if amount.sign() == num::bigint::Sign::Minus {
        return Err(Error::MalformedNumber(raw.to_owned()));
    }
    let scaled = amount * BigDecimal::new(BigInt::one(), -i64::from(decimals));
    let ratio = decimal_to_rational(&scaled).ok_or(Error::Overflow)?;
    Ok(ratio.numer() / ratio.denom())
}

/// Interprets a decimal string as an amount of the base currency in its
/// largest unit and converts it to wei.
pub fn parse_ether(raw: &str) -> Result<eth::Wei, Error> {
    parse_scaled(raw, 18).map(eth::Wei)
}

/// Converts a gas price quoted in the million-wei denomination to wei.
pub fn parse_mwei(raw: &str) -> Result<eth::Wei, Error> {
    parse_scaled(raw, 6).map(eth::Wei)
}

/// Zero-pads a 256-bit integer to a fixed hexadecimal width. Used to build
/// ABI call data.
pub fn to_padded_hex(value: U256, width: usize) -> Result<String, Error> {
    let hex = format!("{value:x}");
    if hex.len() > width {
        return Err(Error::Overflow);
    }
    Ok(format!("{hex:0>width$}"))
}

/// Converts a wei amount into an exact `BigDecimal` representation.
pub fn wei_to_decimal(wei: &eth::Wei) -> BigDecimal {
    BigDecimal::new(u256_to_biguint(&wei.0).into(), 18)
}

/// Converts a token amount into an exact `BigDecimal` representation using
/// its declared decimal scale.
pub fn units_to_decimal(units: &eth::TokenUnits) -> BigDecimal {
    BigDecimal::new(
        u256_to_biguint(&units.amount).into(),
        i64::from(units.decimals),
    )
}

/// Converts a `BigDecimal` value to a rational of `U256` integers. Returns
/// `None` if the value is negative or does not fit.
fn decimal_to_rational(d: &BigDecimal) -> Option<Rational> {
    let (int, exp) = d.as_bigint_and_exponent();

    // First convert to a `Ratio<BigUint>`. This ensures that the ratio is
    // normalized (i.e. GCD of numerator and denominator is 1) before trying to
    // convert the components to `U256`s. This allows values like `1.00...000`
    // that would otherwise overflow a `U256` numerator.
    let uint = int.to_biguint()?;
    let factor = BigUint::from(10_u8).pow(exp.unsigned_abs().try_into().ok()?);
    let ratio = if exp >= 0 {
        Ratio::new(uint, factor)
    } else {
        Ratio::new(uint * factor, num::one())
    };

    let numer = biguint_to_u256(ratio.numer())?;
    let denom = biguint_to_u256(ratio.denom())?;

    Some(Rational::new_raw(numer, denom))
}

fn biguint_to_u256(i: &BigUint) -> Option<U256> {
    let bytes = i.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    Some(U256::from_be_slice(&bytes))
}

fn u256_to_biguint(i: &U256) -> BigUint {
    BigUint::from_bytes_be(&i.to_be_bytes::<32>())
}
