use crate::{
    domain::{eth, sync},
    tests::{abi_string, address, mock::node::Expectation, setup, setup_with},
    util::{abi, conv},
};

const HOLDER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BETA: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn read(selector: &str, result: serde_json::Value) -> Expectation {
    Expectation::call(
        "eth_call",
        serde_json::json!([{ "to": BETA, "data": selector }, "latest"]),
        result,
    )
}

#[tokio::test]
async fn token_discovery_cascades_into_details_and_holdings() {
    let (_node, sync) = setup_with(
        vec![
            Expectation::call("eth_accounts", serde_json::json!([]), serde_json::json!([HOLDER])),
            Expectation::call(
                "eth_getBalance",
                serde_json::json!([HOLDER, "latest"]),
                serde_json::json!("0x0"),
            ),
            Expectation::call(
                "wallet_contracts",
                serde_json::json!([]),
                serde_json::json!([
                    { "address": BETA, "name": "Beta", "features": ["erc20"] },
                    { "address": "0xdddddddddddddddddddddddddddddddddddddddd", "name": "Untagged" },
                ]),
            ),
            read(abi::TOTAL_SUPPLY, serde_json::json!("0x64")),
            read(abi::DECIMALS, serde_json::json!("0x12")),
            read(abi::SYMBOL, serde_json::json!(abi_string("BEC"))),
            Expectation::call(
                "eth_call",
                serde_json::json!([
                    { "to": BETA, "data": abi::balance_of(address(HOLDER)) },
                    "latest",
                ]),
                serde_json::json!("0x64"),
            ),
        ],
        sync::Config {
            native_symbol: Some("ETC".to_owned()),
            ..Default::default()
        },
    )
    .await;

    sync.load_accounts().await.unwrap();
    sync.load_token_list().await.unwrap();

    let snapshot = sync.snapshot().await;
    assert!(!snapshot.tokens.is_loading());

    // The native pseudo-token stays at the front of the listing; the
    // untagged contract never makes it in.
    assert_eq!(snapshot.tokens.len(), 2);
    let native = snapshot.tokens.iter().next().unwrap();
    assert_eq!(native.address, None);
    assert_eq!(native.symbol.as_deref(), Some("ETC"));

    let beta = snapshot.tokens.get(address(BETA).into()).unwrap();
    assert_eq!(beta.name.as_deref(), Some("Beta"));
    assert_eq!(beta.symbol.as_deref(), Some("BEC"));
    assert_eq!(beta.decimals, 18);
    assert_eq!(beta.total_supply, Some(eth::U256::from(100)));

    // The holding was fetched after the decimals merged, so it carries the
    // right scale and an exact human representation.
    let beta = eth::TokenAddress(address(BETA));
    let held = snapshot.accounts.get(address(HOLDER)).unwrap().token_balances[&beta].balance;
    assert_eq!(held, eth::TokenUnits::new(eth::U256::from(100), 18));
    assert_eq!(
        conv::units_to_decimal(&held),
        "0.0000000000000001".parse().unwrap()
    );
}

#[tokio::test]
async fn failed_detail_legs_do_not_block_their_siblings() {
    let (_node, sync) = setup(vec![
        Expectation::call(
            "wallet_contracts",
            serde_json::json!([]),
            serde_json::json!([{ "address": BETA, "name": "Beta", "features": ["erc20"] }]),
        ),
        read(abi::TOTAL_SUPPLY, serde_json::json!("0x64")),
        read(abi::DECIMALS, serde_json::json!("0x12")),
        Expectation::fault(
            "eth_call",
            serde_json::json!([{ "to": BETA, "data": abi::SYMBOL }, "latest"]),
            -32000,
            "execution reverted",
        ),
    ])
    .await;

    sync.load_token_list().await.unwrap();

    let beta = sync.snapshot().await.tokens.get(address(BETA).into()).unwrap().clone();
    assert_eq!(beta.symbol, None);
    assert_eq!(beta.decimals, 18);
    assert_eq!(beta.total_supply, Some(eth::U256::from(100)));
}

#[tokio::test]
async fn added_tokens_are_registered_and_enriched() {
    let (_node, sync) = setup(vec![
        Expectation::call(
            "wallet_addContract",
            serde_json::json!([{ "address": BETA, "name": "Beta" }]),
            serde_json::json!(true),
        ),
        read(abi::TOTAL_SUPPLY, serde_json::json!("0x64")),
        read(abi::DECIMALS, serde_json::json!("0x2")),
        read(abi::SYMBOL, serde_json::json!(abi_string("BEC"))),
    ])
    .await;

    sync.add_token(address(BETA), "Beta").await.unwrap();

    let beta = sync.snapshot().await.tokens.get(address(BETA).into()).unwrap().clone();
    assert_eq!(beta.name.as_deref(), Some("Beta"));
    assert_eq!(beta.symbol.as_deref(), Some("BEC"));
    assert_eq!(beta.decimals, 2);
}
