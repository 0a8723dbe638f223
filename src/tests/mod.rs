use crate::{
    domain::{eth, sync},
    infra::rpc,
    tests::mock::node::{Expectation, ServerHandle},
};

mod mock;
mod tokens;

/// Spins up a mock node with the given expectations and a session pointed at
/// it.
pub async fn setup(expectations: Vec<Expectation>) -> (ServerHandle, sync::Sync<rpc::Client>) {
    setup_with(expectations, sync::Config::default()).await
}

pub async fn setup_with(
    expectations: Vec<Expectation>,
    config: sync::Config,
) -> (ServerHandle, sync::Sync<rpc::Client>) {
    let node = mock::node::setup(expectations).await;
    let client = rpc::Client::new(rpc::Config {
        endpoint: node.url(),
    })
    .unwrap();
    (node, sync::Sync::new(client, config))
}

pub fn address(raw: &str) -> eth::Address {
    raw.parse().unwrap()
}

/// Encodes a string the way an ABI `string` return travels on the wire.
pub fn abi_string(value: &str) -> String {
    format!(
        "0x{:064x}{:064x}{}",
        0x20,
        value.len(),
        format!("{:0<64}", hex::encode(value))
    )
}
