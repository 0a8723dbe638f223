pub use alloy::primitives::{Address, B256, U256};

/// An ERC20 token contract address.
///
/// https://eips.ethereum.org/EIPS/eip-20
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TokenAddress(pub Address);

impl From<Address> for TokenAddress {
    fn from(inner: Address) -> Self {
        Self(inner)
    }
}

/// A transaction hash.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct TxHash(pub B256);

impl From<B256> for TxHash {
    fn from(inner: B256) -> Self {
        Self(inner)
    }
}

impl std::str::FromStr for TxHash {
    type Err = alloy::primitives::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A base-currency amount in wei.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Wei(pub U256);

impl From<U256> for Wei {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

/// A token amount in its smallest unit, paired with the token's declared
/// decimal scale. Two amounts are only comparable or addable when their
/// scales match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TokenUnits {
    pub amount: U256,
    pub decimals: u32,
}

impl TokenUnits {
    pub fn new(amount: U256, decimals: u32) -> Self {
        Self { amount, decimals }
    }

    /// Adds two amounts of the same token. Returns `None` when the scales
    /// differ or the sum overflows.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        (self.decimals == other.decimals)
            .then(|| self.amount.checked_add(other.amount))
            .flatten()
            .map(|amount| Self {
                amount,
                decimals: self.decimals,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_units_addition_requires_matching_scales() {
        let a = TokenUnits::new(U256::from(100), 2);
        let b = TokenUnits::new(U256::from(23), 2);
        assert_eq!(a.checked_add(b), Some(TokenUnits::new(U256::from(123), 2)));

        let c = TokenUnits::new(U256::from(23), 6);
        assert_eq!(a.checked_add(c), None);
    }

    #[test]
    fn token_units_addition_detects_overflow() {
        let a = TokenUnits::new(U256::MAX, 18);
        let b = TokenUnits::new(U256::from(1), 18);
        assert_eq!(a.checked_add(b), None);
    }
}
