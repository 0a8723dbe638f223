//! Synchronization actions: the control layer that keeps the local snapshot
//! converging on the node's view. Discovery cascades (new account → fetch its
//! balances, new token → fetch its details and everyone's holdings) are
//! expressed as explicit orchestration methods over an injected gateway, with
//! a configurable cap on concurrent RPC calls. Legs of a cascade are
//! independent: they complete in any order, and a failed leg is logged and
//! never aborts its siblings.

use {
    crate::{
        domain::{account, eth, token, transaction},
        infra::rpc,
        util::{abi, conv, serialize},
    },
    futures::{StreamExt, stream},
    serde::Serialize,
    serde_json::json,
    serde_with::serde_as,
    std::num::NonZeroUsize,
    tokio::sync::Mutex,
};

/// Registry methods listing and extending the set of known token contracts.
/// Served by wallet-aware nodes alongside the standard `eth` namespace.
const REGISTRY_CONTRACTS: &str = "wallet_contracts";
const REGISTRY_ADD_CONTRACT: &str = "wallet_addContract";

/// The combined local snapshot. Only ever replaced wholesale through the pure
/// merge operations of its parts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    pub accounts: account::Accounts,
    pub tokens: token::Tokens,
    pub transactions: transaction::Transactions,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Upper bound on concurrently issued RPC calls while cascading fetches.
    /// Loading N accounts against M known tokens otherwise issues O(N×M)
    /// calls at once.
    pub concurrent_requests: NonZeroUsize,

    /// Display symbol of the base currency. When set, a pseudo-token with no
    /// contract address is prepended to the registry for listing purposes.
    pub native_symbol: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrent_requests: NonZeroUsize::new(8).unwrap(),
            native_symbol: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Rpc(#[from] rpc::Error),
    #[error(transparent)]
    Number(#[from] conv::Error),
    #[error(transparent)]
    Abi(#[from] abi::Error),
    #[error(transparent)]
    Transaction(#[from] transaction::Error),
    #[error("unexpected rpc result shape: {0}")]
    Result(#[from] serde_json::Error),
    #[error("token {0:?} is not registered")]
    UnknownToken(eth::TokenAddress),
}

/// A submitted-transaction description, as collected by the presentation
/// layer.
#[derive(Clone, Debug)]
pub struct Transfer {
    pub from: eth::Address,
    pub to: eth::Address,
    pub gas: eth::U256,
    pub gas_price: eth::Wei,
    pub amount: Amount,
}

/// What a transfer moves: base currency in wei, or a token amount given as a
/// human decimal string to be scaled by the token's registered decimals.
#[derive(Clone, Debug)]
pub enum Amount {
    Ether(eth::Wei),
    Token {
        token: eth::TokenAddress,
        amount: String,
    },
}

/// The synchronization session: the local snapshot plus the gateway used to
/// keep it current. All methods take `&self`; one intent may be in flight
/// while others are dispatched, and merges observe whatever snapshot exists
/// at the moment they run.
pub struct Sync<G> {
    gateway: G,
    state: Mutex<State>,
    concurrency: usize,
}

impl<G: rpc::Gateway> Sync<G> {
    pub fn new(gateway: G, config: Config) -> Self {
        let tokens = match &config.native_symbol {
            Some(symbol) => token::Tokens::with_native(symbol),
            None => token::Tokens::default(),
        };
        Self {
            gateway,
            state: Mutex::new(State {
                tokens,
                ..Default::default()
            }),
            concurrency: config.concurrent_requests.get(),
        }
    }

    /// A cloned read of the current snapshot.
    pub async fn snapshot(&self) -> State {
        self.state.lock().await.clone()
    }

    /// Fetches the node's account list, replaces the account store with it,
    /// and fans out a balance fetch per discovered account.
    pub async fn load_accounts(&self) -> Result<(), Error> {
        {
            let mut state = self.state.lock().await;
            state.accounts = state.accounts.mark_loading();
        }
        let result = self.gateway.call("eth_accounts", vec![]).await?;
        let ids: Vec<eth::Address> = serde_json::from_value(result)?;
        {
            let mut state = self.state.lock().await;
            state.accounts = state.accounts.set_list(ids.iter().copied());
        }
        self.fan_out(ids.into_iter().map(|id| self.load_balance(id)))
            .await;
        Ok(())
    }

    /// Fetches an account's base balance and, unless the token registry is
    /// itself mid-load, the account's balance of every token known at
    /// dispatch time. Tokens added afterwards are picked up by the registry's
    /// own detail cascade or the next balance load.
    pub async fn load_balance(&self, id: eth::Address) -> Result<(), Error> {
        let result = self
            .gateway
            .call("eth_getBalance", vec![json!(id), json!("latest")])
            .await?;
        let raw: String = serde_json::from_value(result)?;
        let tokens = {
            let mut state = self.state.lock().await;
            state.accounts = state.accounts.set_balance(id, &raw)?;
            if state.tokens.is_loading() {
                return Ok(());
            }
            state.tokens.on_chain().cloned().collect::<Vec<_>>()
        };
        self.fan_out(
            tokens
                .iter()
                .map(|token| self.load_token_balance(token, id)),
        )
        .await;
        Ok(())
    }

    /// Fetches an account's transaction count (nonce).
    pub async fn load_tx_count(&self, id: eth::Address) -> Result<(), Error> {
        let result = self
            .gateway
            .call("eth_getTransactionCount", vec![json!(id), json!("latest")])
            .await?;
        let raw: String = serde_json::from_value(result)?;
        let mut state = self.state.lock().await;
        state.accounts = state.accounts.set_tx_count(id, &raw)?;
        Ok(())
    }

    /// Fetches the contract registry, replaces the token store with the
    /// ERC-20-tagged entries, and fans out a detail fetch per token.
    pub async fn load_token_list(&self) -> Result<(), Error> {
        {
            let mut state = self.state.lock().await;
            state.tokens = state.tokens.mark_loading();
        }
        let result = self.gateway.call(REGISTRY_CONTRACTS, vec![]).await?;
        let contracts: Vec<token::Contract> = serde_json::from_value(result)?;
        let addresses = {
            let mut state = self.state.lock().await;
            state.tokens = state.tokens.set_list(contracts);
            state
                .tokens
                .on_chain()
                .filter_map(|token| token.address)
                .collect::<Vec<_>>()
        };
        self.fan_out(
            addresses
                .into_iter()
                .map(|address| self.load_token_details(address)),
        )
        .await;
        Ok(())
    }

    /// Issues the three independent detail reads for a token (total supply,
    /// decimals, symbol), merging each on completion, then fans out a balance
    /// fetch for every currently-known account unless the account store is
    /// mid-load. The balance fetches run against the freshly merged token, so
    /// balances stored before decimals resolved get replaced at the right
    /// scale here.
    pub async fn load_token_details(&self, address: eth::TokenAddress) -> Result<(), Error> {
        let (supply, decimals, symbol) = futures::join!(
            self.read_token(address, abi::TOTAL_SUPPLY),
            self.read_token(address, abi::DECIMALS),
            self.read_token(address, abi::SYMBOL),
        );
        self.merge_detail(address, "totalSupply", supply, |tokens, raw| {
            tokens.set_total_supply(address, raw).map_err(Into::into)
        })
        .await;
        self.merge_detail(address, "decimals", decimals, |tokens, raw| {
            tokens.set_decimals(address, raw).map_err(Into::into)
        })
        .await;
        self.merge_detail(address, "symbol", symbol, |tokens, raw| {
            tokens.set_symbol(address, raw).map_err(Into::into)
        })
        .await;

        let (token, ids) = {
            let state = self.state.lock().await;
            if state.accounts.is_loading() {
                return Ok(());
            }
            (state.tokens.get(address).cloned(), state.accounts.ids())
        };
        let Some(token) = token else {
            return Ok(());
        };
        self.fan_out(
            ids.into_iter()
                .map(|id| self.load_token_balance(&token, id)),
        )
        .await;
        Ok(())
    }

    /// Fetches one account's balance of one token via `balanceOf` call data.
    /// The token's decimals and symbol are taken from the snapshot passed in,
    /// i.e. as known at dispatch time.
    pub async fn load_token_balance(
        &self,
        token: &token::Token,
        id: eth::Address,
    ) -> Result<(), Error> {
        let Some(address) = token.address else {
            return Ok(());
        };
        let raw = self.eth_call(address, abi::balance_of(id)).await?;
        let mut state = self.state.lock().await;
        state.accounts = state.accounts.set_token_balance(id, token, &raw)?;
        Ok(())
    }

    /// Creates a new account on the node and starts tracking it. Requires the
    /// node's unlocked `personal` API, which is unsafe to expose over public
    /// RPC; prefer IPC deployments for this path.
    pub async fn create_account(&self, password: &str) -> Result<eth::Address, Error> {
        let result = self
            .gateway
            .call("personal_newAccount", vec![json!(password)])
            .await?;
        let id: eth::Address = serde_json::from_value(result)?;
        {
            let mut state = self.state.lock().await;
            state.accounts = state.accounts.add(id);
        }
        self.load_balance(id).await?;
        Ok(id)
    }

    /// Registers a token contract with the node's registry, appends a local
    /// stub, and fetches its details.
    pub async fn add_token(&self, address: eth::Address, name: &str) -> Result<(), Error> {
        self.gateway
            .call(
                REGISTRY_ADD_CONTRACT,
                vec![json!({ "address": address, "name": name })],
            )
            .await?;
        {
            let mut state = self.state.lock().await;
            state.tokens = state.tokens.add(address, name);
        }
        self.load_token_details(address.into()).await
    }

    /// Submits a value or token transfer. On success the hash is tracked and
    /// the sender's balance (native case) or the token's details (token case)
    /// are refreshed; a failed refresh does not fail the submission.
    pub async fn send_transaction(&self, transfer: Transfer) -> Result<eth::TxHash, Error> {
        let hash = match &transfer.amount {
            Amount::Ether(value) => self.send_ether(&transfer, *value).await?,
            Amount::Token { token, amount } => {
                self.send_token(&transfer, *token, amount).await?
            }
        };
        {
            let mut state = self.state.lock().await;
            state.transactions = state.transactions.track(hash);
        }
        let refresh = match transfer.amount {
            Amount::Ether(_) => self.load_balance(transfer.from).await,
            Amount::Token { token, .. } => self.load_token_details(token).await,
        };
        if let Err(err) = refresh {
            tracing::warn!(?err, ?hash, "post-send refresh failed");
        }
        Ok(hash)
    }

    /// Inserts a pending entry for an externally submitted transaction.
    pub async fn track(&self, hash: eth::TxHash) {
        let mut state = self.state.lock().await;
        state.transactions = state.transactions.track(hash);
    }

    /// Polls every tracked hash once. Null results leave entries pending;
    /// structured results transition them to observed. Invoked by the owning
    /// process on a timer of its choosing; there is no internal scheduler.
    pub async fn refresh_transactions(&self) {
        let hashes = self.state.lock().await.transactions.hashes();
        self.fan_out(
            hashes
                .into_iter()
                .map(|hash| self.refresh_transaction(hash)),
        )
        .await;
    }

    async fn refresh_transaction(&self, hash: eth::TxHash) -> Result<(), Error> {
        let result = self
            .gateway
            .call("eth_getTransactionByHash", vec![json!(hash)])
            .await?;
        if !result.is_object() {
            // Not yet known to the node; stays pending.
            return Ok(());
        }
        let mut state = self.state.lock().await;
        state.transactions = state.transactions.observe(&result)?;
        Ok(())
    }

    async fn send_ether(&self, transfer: &Transfer, value: eth::Wei) -> Result<eth::TxHash, Error> {
        let request = TransactionRequest {
            from: transfer.from,
            to: transfer.to,
            gas: transfer.gas,
            gas_price: transfer.gas_price.0,
            value: value.0,
            data: None,
        };
        let result = self
            .gateway
            .call("eth_sendTransaction", vec![serde_json::to_value(&request)?])
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn send_token(
        &self,
        transfer: &Transfer,
        token: eth::TokenAddress,
        amount: &str,
    ) -> Result<eth::TxHash, Error> {
        let decimals = self
            .state
            .lock()
            .await
            .tokens
            .get(token)
            .map(|token| token.decimals)
            .ok_or(Error::UnknownToken(token))?;
        let units = conv::parse_scaled(amount, decimals)?;
        let request = TransactionRequest {
            from: transfer.from,
            to: token.0,
            gas: transfer.gas,
            gas_price: transfer.gas_price.0,
            value: eth::U256::ZERO,
            data: Some(abi::transfer(transfer.to, units)),
        };
        let result = self
            .gateway
            .call("eth_sendTransaction", vec![serde_json::to_value(&request)?])
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn read_token(&self, token: eth::TokenAddress, selector: &str) -> Result<String, Error> {
        self.eth_call(token, selector.to_owned()).await
    }

    async fn eth_call(&self, to: eth::TokenAddress, data: String) -> Result<String, Error> {
        let call = CallRequest { to: to.0, data };
        let result = self
            .gateway
            .call(
                "eth_call",
                vec![serde_json::to_value(&call)?, json!("latest")],
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Runs the given cascade legs with capped concurrency. Legs complete in
    /// any order; failures are logged and do not cancel siblings.
    async fn fan_out<F>(&self, legs: impl Iterator<Item = F>)
    where
        F: Future<Output = Result<(), Error>>,
    {
        stream::iter(legs)
            .buffer_unordered(self.concurrency)
            .for_each(|result| async {
                if let Err(err) = result {
                    tracing::warn!(?err, "cascade leg failed");
                }
            })
            .await;
    }

    /// Merges one token detail leg, logging instead of propagating so that a
    /// failed or malformed leg never prevents its siblings from merging.
    async fn merge_detail(
        &self,
        token: eth::TokenAddress,
        field: &'static str,
        fetched: Result<String, Error>,
        merge: impl FnOnce(&token::Tokens, &str) -> Result<token::Tokens, Error>,
    ) {
        let raw = match fetched {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(?err, ?token, field, "token detail fetch failed");
                return;
            }
        };
        let mut state = self.state.lock().await;
        match merge(&state.tokens, &raw) {
            Ok(tokens) => state.tokens = tokens,
            Err(err) => {
                tracing::warn!(?err, ?token, field, "discarding malformed token detail")
            }
        }
    }
}

#[serde_as]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest {
    from: eth::Address,
    to: eth::Address,
    #[serde_as(as = "serialize::Hex")]
    gas: eth::U256,
    #[serde_as(as = "serialize::Hex")]
    gas_price: eth::U256,
    #[serde_as(as = "serialize::Hex")]
    value: eth::U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
struct CallRequest {
    to: eth::Address,
    data: String,
}
