//! The transaction tracker: a watch-list of submitted or observed transaction
//! hashes, reconciled against the node by repeated polling. The tracker owns
//! no timer; callers invoke the refresh at an interval of their choosing.

use {crate::{domain::eth, util::conv}, serde_json::Value};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// Submitted or explicitly tracked; the node has not yet returned a
    /// structured result for the hash.
    Pending,
    /// The node returned a structured transaction object. Terminal.
    Observed,
}

/// A transaction under local observation.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedTransaction {
    pub hash: eth::TxHash,
    pub status: Status,
    /// Normalized from the fact's hex string once observed.
    pub value: Option<eth::Wei>,
    pub gas_price: Option<eth::Wei>,
    /// The last-known transaction object as delivered by the node.
    pub raw: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transaction fact is missing a hash")]
    MissingHash,
    #[error("malformed transaction hash")]
    MalformedHash,
    #[error(transparent)]
    Number(#[from] conv::Error),
}

/// Immutable snapshot of all tracked transactions. Entries are unique by hash
/// and never removed; history is retained for the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transactions {
    transactions: Vec<TrackedTransaction>,
}

impl Transactions {
    /// Inserts a pending entry. Idempotent for already-tracked hashes.
    pub fn track(&self, hash: eth::TxHash) -> Self {
        let mut next = self.clone();
        if next.get(hash).is_none() {
            next.transactions.push(TrackedTransaction {
                hash,
                status: Status::Pending,
                value: None,
                gas_price: None,
                raw: None,
            });
        }
        next
    }

    /// Merges a structured `eth_getTransactionByHash` result into the tracked
    /// entry, normalizing `value` and `gasPrice` to wei. Facts for untracked
    /// hashes are discarded; malformed numeric fields abort the merge without
    /// touching the snapshot. Re-observing is idempotent and never reverts an
    /// entry to pending.
    pub fn observe(&self, fact: &Value) -> Result<Self, Error> {
        let hash: eth::TxHash = fact
            .get("hash")
            .and_then(Value::as_str)
            .ok_or(Error::MissingHash)?
            .parse()
            .map_err(|_| Error::MalformedHash)?;
        let value = hex_field(fact, "value")?;
        let gas_price = hex_field(fact, "gasPrice")?;
        Ok(self.update(hash, |tx| {
            tx.status = Status::Observed;
            tx.value = value;
            tx.gas_price = gas_price;
            tx.raw = Some(fact.clone());
        }))
    }

    pub fn get(&self, hash: eth::TxHash) -> Option<&TrackedTransaction> {
        self.transactions.iter().find(|tx| tx.hash == hash)
    }

    pub fn hashes(&self) -> Vec<eth::TxHash> {
        self.transactions.iter().map(|tx| tx.hash).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedTransaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn update(&self, hash: eth::TxHash, f: impl FnOnce(&mut TrackedTransaction)) -> Self {
        let mut next = self.clone();
        if let Some(tx) = next.transactions.iter_mut().find(|tx| tx.hash == hash) {
            f(tx);
        }
        next
    }
}

fn hex_field(fact: &Value, field: &str) -> Result<Option<eth::Wei>, conv::Error> {
    fact.get(field)
        .and_then(Value::as_str)
        .map(|raw| conv::hex_to_u256(raw).map(eth::Wei))
        .transpose()
}
