//! The account state store: an ordered, immutable snapshot of known accounts
//! and their balances. Quantities are always whole-field replacements of
//! facts delivered by the node, never locally computed increments.

use {
    crate::{
        domain::{eth, token},
        util::conv,
    },
    std::collections::BTreeMap,
};

/// A known account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub id: eth::Address,
    /// Absent until first fetched.
    pub balance: Option<eth::Wei>,
    /// The account nonce; absent until first fetched.
    pub tx_count: Option<u64>,
    /// Per-token balances, created lazily on first observation.
    pub token_balances: BTreeMap<eth::TokenAddress, TokenBalance>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenBalance {
    /// Display symbol as known when the balance was merged.
    pub symbol: Option<String>,
    pub balance: eth::TokenUnits,
}

impl Account {
    fn new(id: eth::Address) -> Self {
        Self {
            id,
            balance: None,
            tx_count: None,
            token_balances: BTreeMap::new(),
        }
    }
}

/// Immutable snapshot of all known accounts, ordered by insertion for stable
/// listing, with lookups by id. Merge operations return a fresh snapshot;
/// merges addressing an unknown account are silent no-ops.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Accounts {
    accounts: Vec<Account>,
    loading: bool,
}

impl Accounts {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Flags the store as mid-refresh, suppressing token balance cascades
    /// until the fresh account list arrives.
    pub fn mark_loading(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            loading: true,
        }
    }

    /// Replaces the account sequence with one freshly-initialized entry per
    /// id, preserving input order, and clears the loading flag. The new list
    /// is authoritative: previously known accounts absent from it are
    /// dropped, and previously fetched fields are reset.
    pub fn set_list(&self, ids: impl IntoIterator<Item = eth::Address>) -> Self {
        Self {
            accounts: ids.into_iter().map(Account::new).collect(),
            loading: false,
        }
    }

    /// Appends a freshly-initialized account. Idempotent for already-known
    /// ids, since a duplicate would make per-id merges ambiguous.
    pub fn add(&self, id: eth::Address) -> Self {
        let mut next = self.clone();
        if next.get(id).is_none() {
            next.accounts.push(Account::new(id));
        }
        next
    }

    /// Merges a base-currency balance fact, replacing the previous value.
    pub fn set_balance(&self, id: eth::Address, raw: &str) -> Result<Self, conv::Error> {
        let balance = eth::Wei(conv::hex_to_u256(raw)?);
        Ok(self.update(id, |account| account.balance = Some(balance)))
    }

    /// Merges a transaction count fact.
    pub fn set_tx_count(&self, id: eth::Address, raw: &str) -> Result<Self, conv::Error> {
        let count = conv::hex_to_u64(raw)?;
        Ok(self.update(id, |account| account.tx_count = Some(count)))
    }

    /// Merges a `balanceOf` fact, scaled with the token's decimals as known
    /// at merge time. A later decimals update does not rescale this entry; a
    /// fresh fetch replaces it instead.
    pub fn set_token_balance(
        &self,
        id: eth::Address,
        token: &token::Token,
        raw: &str,
    ) -> Result<Self, conv::Error> {
        let Some(address) = token.address else {
            // The native pseudo-token has no balanceOf.
            return Ok(self.clone());
        };
        let balance = eth::TokenUnits::new(conv::hex_to_u256(raw)?, token.decimals);
        let symbol = token.symbol.clone();
        Ok(self.update(id, |account| {
            account
                .token_balances
                .insert(address, TokenBalance { symbol, balance });
        }))
    }

    pub fn get(&self, id: eth::Address) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn ids(&self) -> Vec<eth::Address> {
        self.accounts.iter().map(|account| account.id).collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn update(&self, id: eth::Address, f: impl FnOnce(&mut Account)) -> Self {
        let mut next = self.clone();
        if let Some(account) = next.accounts.iter_mut().find(|account| account.id == id) {
            f(account);
        }
        next
    }
}
