//! The token registry: an ordered, immutable snapshot of known token
//! contracts, enriched field by field as detail fetches complete.

use {
    crate::{
        domain::eth,
        util::{abi, conv},
    },
    serde::Deserialize,
};

/// The registry capability tag identifying ERC-20 contracts.
pub const ERC20_FEATURE: &str = "erc20";

/// A contract entry as listed by the node's registry.
#[derive(Clone, Debug, Deserialize)]
pub struct Contract {
    pub address: eth::Address,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// A known token. Fields other than the address arrive asynchronously and
/// independently; a failed detail fetch leaves the others untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// `None` marks the synthetic pseudo-token for the base currency, which
    /// is never the target of on-chain lookups.
    pub address: Option<eth::TokenAddress>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: u32,
    pub total_supply: Option<eth::U256>,
}

impl Token {
    fn stub(address: eth::TokenAddress, name: Option<String>) -> Self {
        Self {
            address: Some(address),
            name,
            symbol: None,
            decimals: 0,
            total_supply: None,
        }
    }
}

/// Immutable snapshot of the token registry. All merge operations return a
/// fresh snapshot and leave the input untouched; merges addressing an unknown
/// token are silent no-ops.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tokens {
    tokens: Vec<Token>,
    loading: bool,
}

impl Tokens {
    /// Creates a registry seeded with the pseudo-token representing the base
    /// currency.
    pub fn with_native(symbol: &str) -> Self {
        Self {
            tokens: vec![Token {
                address: None,
                name: None,
                symbol: Some(symbol.to_owned()),
                decimals: 18,
                total_supply: None,
            }],
            loading: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Flags the registry as mid-refresh, suppressing balance-discovery
    /// cascades until the fresh list arrives.
    pub fn mark_loading(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            loading: true,
        }
    }

    /// Replaces the full token sequence with the contracts advertising the
    /// ERC-20 capability tag, preserving input order and any native
    /// pseudo-token. Clears the loading flag.
    pub fn set_list(&self, contracts: impl IntoIterator<Item = Contract>) -> Self {
        let mut tokens: Vec<_> = self
            .tokens
            .iter()
            .filter(|token| token.address.is_none())
            .cloned()
            .collect();
        tokens.extend(
            contracts
                .into_iter()
                .filter(|contract| contract.features.iter().any(|tag| tag == ERC20_FEATURE))
                .map(|contract| Token::stub(contract.address.into(), contract.name)),
        );
        Self {
            tokens,
            loading: false,
        }
    }

    /// Appends a token stub. Idempotent for already-known addresses.
    pub fn add(&self, address: eth::Address, name: &str) -> Self {
        let address = eth::TokenAddress(address);
        let mut next = self.clone();
        if next.get(address).is_none() {
            next.tokens.push(Token::stub(address, Some(name.to_owned())));
        }
        next
    }

    /// Merges a `symbol()` return value, decoding the ABI string layout.
    pub fn set_symbol(&self, address: eth::TokenAddress, raw: &str) -> Result<Self, abi::Error> {
        let symbol = abi::decode_string(raw)?;
        Ok(self.update(address, |token| token.symbol = Some(symbol)))
    }

    /// Merges a `decimals()` return value. Already-stored balances scaled
    /// with the previous value are not revisited; the detail cascade issues
    /// fresh balance fetches after this merge.
    pub fn set_decimals(&self, address: eth::TokenAddress, raw: &str) -> Result<Self, conv::Error> {
        let decimals =
            u32::try_from(conv::hex_to_u64(raw)?).map_err(|_| conv::Error::Overflow)?;
        Ok(self.update(address, |token| token.decimals = decimals))
    }

    /// Merges a `totalSupply()` return value.
    pub fn set_total_supply(
        &self,
        address: eth::TokenAddress,
        raw: &str,
    ) -> Result<Self, conv::Error> {
        let supply = conv::hex_to_u256(raw)?;
        Ok(self.update(address, |token| token.total_supply = Some(supply)))
    }

    pub fn get(&self, address: eth::TokenAddress) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.address == Some(address))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    /// The tokens that have an on-chain contract, i.e. everything except the
    /// native pseudo-token.
    pub fn on_chain(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| token.address.is_some())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn update(&self, address: eth::TokenAddress, f: impl FnOnce(&mut Token)) -> Self {
        let mut next = self.clone();
        if let Some(token) = next
            .tokens
            .iter_mut()
            .find(|token| token.address == Some(address))
        {
            f(token);
        }
        next
    }
}
