//! The JSON-RPC gateway to the node. The synchronization core only depends on
//! the [`Gateway`] contract; the bundled [`Client`] speaks JSON-RPC 2.0 over
//! HTTP via `reqwest`.

use {
    serde::Deserialize,
    std::sync::atomic::{self, AtomicU64},
    tracing::Instrument,
};

/// The request/response channel to the node: a method name and JSON params
/// in, a JSON result value or a fault out. There is no cancellation; an
/// issued call runs to completion or failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, Error>;
}

pub struct Config {
    /// The URL of the node's HTTP endpoint.
    pub endpoint: reqwest::Url,
}

/// A JSON-RPC 2.0 client over HTTP.
pub struct Client {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    id: AtomicU64,
}

impl Client {
    pub fn new(config: Config) -> Result<Self, CreationError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint: config.endpoint,
            id: AtomicU64::new(0),
        })
    }
}

#[async_trait::async_trait]
impl Gateway for Client {
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, Error> {
        let id = self.id.fetch_add(1, atomic::Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = async {
            let response = self
                .client
                .post(self.endpoint.clone())
                .json(&body)
                .send()
                .await?
                .error_for_status()?;
            response.json::<Response>().await.map_err(Error::from)
        }
        .instrument(tracing::debug_span!("rpc", %method, id))
        .await?;
        match response.error {
            Some(fault) => Err(Error::Node {
                code: fault.code,
                message: fault.message,
            }),
            None => Ok(response.result),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<Fault>,
}

#[derive(Debug, Deserialize)]
struct Fault {
    code: i64,
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreationError {
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("node fault {code}: {message}")]
    Node { code: i64, message: String },
}
