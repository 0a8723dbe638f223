//! A client that keeps a locally-consistent view of blockchain accounts and
//! fungible-token balances by polling a JSON-RPC node, and submits signed
//! value and token transfers through the same endpoint. The stores are
//! immutable snapshots merged through pure operations; the synchronization
//! layer turns discoveries into capped-concurrency fetch cascades.

pub mod domain;
pub mod infra;
pub mod util;

#[cfg(test)]
mod tests;

pub use crate::domain::{
    account::{Account, Accounts},
    eth::{TokenUnits, Wei},
    sync::{Amount, Config, State, Sync, Transfer},
    token::{Token, Tokens},
    transaction::{Status, TrackedTransaction, Transactions},
};
