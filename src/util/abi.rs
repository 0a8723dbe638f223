//! ERC-20 call data encoding and fixed-layout return value decoding.

use crate::domain::eth;

/// 4-byte selectors of the ERC-20 functions this client touches.
pub const TOTAL_SUPPLY: &str = "0x18160ddd";
pub const DECIMALS: &str = "0x313ce567";
pub const SYMBOL: &str = "0x95d89b41";
pub const NAME: &str = "0x06fdde03";
const BALANCE_OF: &str = "0x70a08231";
const TRANSFER: &str = "0xa9059cbb";

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("return data is not valid hex")]
    InvalidHex,
    #[error("return data too short for its declared string layout")]
    Truncated,
    #[error("string contents are not valid UTF-8")]
    InvalidUtf8,
}

/// Builds the call data for `balanceOf(address)`.
pub fn balance_of(holder: eth::Address) -> String {
    format!("{BALANCE_OF}{}", pad_address(holder))
}

/// Builds the call data for `transfer(address,uint256)`.
pub fn transfer(to: eth::Address, amount: eth::U256) -> String {
    format!("{TRANSFER}{}{}", pad_address(to), pad_uint(amount))
}

/// Decodes a fixed-layout ABI `string` return value: a 32-byte offset word,
/// a 32-byte length word at that offset, then the padded UTF-8 bytes.
pub fn decode_string(raw: &str) -> Result<String, Error> {
    let bytes =
        hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).map_err(|_| Error::InvalidHex)?;
    let offset = word(&bytes, 0)?;
    let length = word(&bytes, offset)?;
    let start = offset.checked_add(32).ok_or(Error::Truncated)?;
    let end = start
        .checked_add(length)
        .filter(|&end| end <= bytes.len())
        .ok_or(Error::Truncated)?;
    String::from_utf8(bytes[start..end].to_vec()).map_err(|_| Error::InvalidUtf8)
}

/// Reads the 32-byte big-endian word starting at `at` as a `usize`.
fn word(bytes: &[u8], at: usize) -> Result<usize, Error> {
    let end = at
        .checked_add(32)
        .filter(|&end| end <= bytes.len())
        .ok_or(Error::Truncated)?;
    usize::try_from(eth::U256::from_be_slice(&bytes[at..end])).map_err(|_| Error::Truncated)
}

fn pad_address(address: eth::Address) -> String {
    format!("{:0>64}", hex::encode(address))
}

fn pad_uint(value: eth::U256) -> String {
    format!("{value:064x}")
}
