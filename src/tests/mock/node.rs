//! A mock JSON-RPC node. Expectations are matched by method and params
//! rather than arrival order, because cascade legs complete unordered.

use {
    std::{
        net::SocketAddr,
        sync::{Arc, Mutex},
    },
    tokio::task::JoinHandle,
};

/// An expected JSON-RPC call and its canned reply.
#[derive(Clone, Debug)]
pub struct Expectation {
    method: &'static str,
    params: Params,
    reply: Reply,
}

#[derive(Clone, Debug)]
pub enum Params {
    /// Any params are accepted.
    Any,
    /// The received params have to match the provided value exactly.
    Exact(serde_json::Value),
}

#[derive(Clone, Debug)]
enum Reply {
    Result(serde_json::Value),
    Fault { code: i64, message: &'static str },
}

impl Expectation {
    /// Expects `method` with exactly `params` and replies with `result`.
    pub fn call(
        method: &'static str,
        params: serde_json::Value,
        result: serde_json::Value,
    ) -> Self {
        Self {
            method,
            params: Params::Exact(params),
            reply: Reply::Result(result),
        }
    }

    /// Expects `method` with any params and replies with `result`.
    pub fn any(method: &'static str, result: serde_json::Value) -> Self {
        Self {
            method,
            params: Params::Any,
            reply: Reply::Result(result),
        }
    }

    /// Expects `method` with exactly `params` and replies with a node fault.
    pub fn fault(
        method: &'static str,
        params: serde_json::Value,
        code: i64,
        message: &'static str,
    ) -> Self {
        Self {
            method,
            params: Params::Exact(params),
            reply: Reply::Fault { code, message },
        }
    }
}

/// Drop handle that verifies all expectations were consumed and that no
/// unexpected request arrived throughout the test.
pub struct ServerHandle {
    address: SocketAddr,
    handle: JoinHandle<()>,
    expectations: Arc<Mutex<Vec<Expectation>>>,
    unexpected: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl ServerHandle {
    pub fn url(&self) -> reqwest::Url {
        format!("http://{}/", self.address).parse().unwrap()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        // Don't cause mass hysteria!
        if std::thread::panicking() {
            return;
        }

        assert!(
            !self.handle.is_finished(),
            "mock node terminated before test ended"
        );
        let unexpected = self.unexpected.lock().unwrap();
        assert!(
            unexpected.is_empty(),
            "mock node received unexpected requests: {unexpected:?}"
        );
        let expectations = self.expectations.lock().unwrap();
        assert!(
            expectations.is_empty(),
            "mock node did not receive enough requests, left over: {expectations:?}"
        );
        self.handle.abort();
    }
}

/// Set up a mock node serving the given expectations.
pub async fn setup(expectations: Vec<Expectation>) -> ServerHandle {
    let state = State {
        expectations: Arc::new(Mutex::new(expectations)),
        unexpected: Arc::new(Mutex::new(Vec::new())),
    };

    let app = axum::Router::new()
        .route(
            "/",
            axum::routing::post(
                |axum::extract::State(state), axum::extract::Json(req)| async move {
                    axum::response::Json(respond(state, req))
                },
            ),
        )
        .with_state(state.clone());

    let server = axum::Server::bind(&"0.0.0.0:0".parse().unwrap()).serve(app.into_make_service());
    let address = server.local_addr();
    let handle = tokio::spawn(async move { server.await.unwrap() });

    ServerHandle {
        address,
        handle,
        expectations: state.expectations,
        unexpected: state.unexpected,
    }
}

#[derive(Clone)]
struct State {
    expectations: Arc<Mutex<Vec<Expectation>>>,
    unexpected: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

fn respond(state: State, req: serde_json::Value) -> serde_json::Value {
    let method = req["method"].as_str().unwrap_or_default().to_owned();
    let params = req["params"].clone();
    let id = req["id"].clone();

    let mut expectations = state.expectations.lock().unwrap();
    let position = expectations.iter().position(|expectation| {
        method == expectation.method
            && match &expectation.params {
                Params::Any => true,
                Params::Exact(expected) => *expected == params,
            }
    });
    match position {
        Some(position) => match expectations.remove(position).reply {
            Reply::Result(result) => serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }),
            Reply::Fault { code, message } => serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message },
            }),
        },
        None => {
            state.unexpected.lock().unwrap().push((method, params));
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "unexpected request" },
            })
        }
    }
}
