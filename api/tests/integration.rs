use std::{collections::HashMap, sync::Arc, time::Duration};

use api::{app::build_router, config::AppConfig, services::DashboardService, state::AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use chain::{BalanceReader, ChainError, ChainResult, DomainResolver, StaticPriceFeeds};
use domain::{Balance, ChainInfo};
use ethers::types::Address;
use num_bigint::{BigInt, BigUint};
use serde_json::{json, Value};
use tower::ServiceExt;

const ALICE: &str = "alice.unwallet.eth";

/// Only `ALICE` resolves, and never on Mumbai.
struct StubResolver;

#[async_trait]
impl DomainResolver for StubResolver {
    async fn resolve(&self, domain: &str, chain_id: u64) -> ChainResult<Option<Address>> {
        if chain_id == 80001 {
            return Err(ChainError::Rpc("mumbai resolver unreachable".to_string()));
        }
        Ok((domain == ALICE).then(|| Address::repeat_byte(0x42)))
    }
}

struct StubBalances;

#[async_trait]
impl BalanceReader for StubBalances {
    async fn native_balance(&self, chain: &ChainInfo, _address: Address) -> ChainResult<Balance> {
        // 1.5 顆原生幣
        Ok(Balance::new(
            chain.native_symbol.clone(),
            chain.native_decimals,
            BigUint::from(1_500_000_000_000_000_000u64),
        ))
    }
}

fn test_chains() -> Vec<ChainInfo> {
    vec![
        ChainInfo::new(11155111, "Sepolia", "ETH"),
        ChainInfo::new(43113, "Avalanche Fuji", "AVAX"),
        ChainInfo::new(80001, "Polygon Mumbai", "MATIC"),
    ]
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        frontend_origins: vec!["http://localhost:3000".to_string()],
        price_feed_rpc_url: "http://localhost:8545".to_string(),
        price_feeds: HashMap::new(),
        static_price_answers: HashMap::new(),
        resolver_rpc_url: "http://localhost:8545".to_string(),
        resolver_address: String::new(),
        resolver_chain_id: 43113,
        chains: test_chains(),
        chain_rpc_urls: HashMap::new(),
        rpc_timeout: Duration::from_secs(1),
        dashboard_refresh_interval: Duration::from_secs(12),
        watch_domains: vec![],
    }
}

fn test_app() -> Router {
    let feeds = StaticPriceFeeds::new(HashMap::from([
        ("ETH".to_string(), BigInt::from(300_000_000_000u64)),
        ("AVAX".to_string(), BigInt::from(2_000_000_000u64)),
    ]));
    let dashboard = Arc::new(DashboardService::new(
        test_chains(),
        Arc::new(StubResolver),
        Arc::new(StubBalances),
        Arc::new(feeds),
    ));
    let state = AppState {
        config: test_config(),
        dashboard,
    };
    build_router(state, vec![])
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn healthz_reports_configured_chains() {
    let (status, body) = get_json(test_app(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["chains"], 3);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn compute_isolates_failed_feed() {
    let (status, body) = post_json(
        test_app(),
        "/api/valuation/compute",
        json!({
            "balances": [
                { "decimals": 18, "symbol": "ETH", "value": "2000000000000000000" },
                { "decimals": 8, "symbol": "BTC", "value": "50000000" }
            ],
            "priceResults": [
                { "ok": true, "answer": "300000000000" },
                { "ok": false }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prices"], json!(["3000", "0"]));
    assert_eq!(body["balancesInUSD"], json!(["6000000000000000000000", "0"]));
    assert_eq!(body["totalBalanceInUSD"], "6000000000000000000000");
    assert_eq!(body["totalFormattedInUSD"], "6000");
}

#[tokio::test]
async fn compute_prices_odd_answer_shape_at_zero() {
    let (status, body) = post_json(
        test_app(),
        "/api/valuation/compute",
        json!({
            "balances": [
                { "decimals": 18, "symbol": "ETH", "value": "1000000000000000000" },
                { "decimals": 18, "symbol": "AVAX", "value": "1000000000000000000" },
                { "decimals": 18, "symbol": "LINK", "value": "1000000000000000000" }
            ],
            "priceResults": [
                { "ok": true, "answer": 1.5 },
                { "ok": true, "answer": "2000000000" },
                { "ok": true, "answer": [1, 2] }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prices"], json!(["0", "20", "0"]));
    assert_eq!(body["balancesInUSD"][0], "0");
    assert_eq!(body["totalFormattedInUSD"], "20");
}

#[tokio::test]
async fn compute_with_no_balances_is_zero() {
    let (status, body) = post_json(
        test_app(),
        "/api/valuation/compute",
        json!({ "balances": [], "priceResults": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prices"], json!([]));
    assert_eq!(body["totalBalanceInUSD"], "0");
    assert_eq!(body["totalFormattedInUSD"], "0");
}

#[tokio::test]
async fn valuation_queries_feeds_per_balance() {
    let (status, body) = post_json(
        test_app(),
        "/api/valuation",
        json!({
            "balances": [
                { "decimals": 18, "symbol": "AVAX", "value": "1000000000000000000" },
                { "decimals": 18, "symbol": "DOGE", "value": "1000000000000000000" }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prices"], json!(["20", "0"]));
    assert_eq!(body["totalFormattedInUSD"], "20");
}

#[tokio::test]
async fn malformed_balance_is_rejected() {
    let (status, _) = post_json(
        test_app(),
        "/api/valuation",
        json!({ "balances": [{ "decimals": 18, "symbol": "ETH", "value": "-5" }] }),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn chains_list_exposes_coin_types() {
    let (status, body) = get_json(test_app(), "/api/chains").await;
    assert_eq!(status, StatusCode::OK);
    let chains = body.as_array().unwrap();
    assert_eq!(chains.len(), 3);
    assert_eq!(chains[1]["id"], 43113);
    assert_eq!(chains[1]["coin_type"], 0x8000_a869u64);
}

#[tokio::test]
async fn chain_details_require_domain_and_known_chain() {
    let (status, _) = get_json(test_app(), "/api/chains/43113/details").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(test_app(), "/api/chains/1/details?domain=alice.unwallet.eth").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        get_json(test_app(), "/api/chains/43113/details?domain=alice.unwallet.eth").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolved"], true);
    assert_eq!(
        body["resolved_address"],
        "0x4242424242424242424242424242424242424242"
    );
    assert_eq!(body["formatted_balance"], "1.5");
    assert_eq!(body["symbol"], "AVAX");
}

#[tokio::test]
async fn dashboard_values_resolved_chains() {
    let (status, body) = get_json(test_app(), "/api/dashboard/alice.unwallet.eth").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain"], ALICE);

    let chains = body["chains"].as_array().unwrap();
    assert_eq!(chains.len(), 3);
    // Mumbai 解析失敗，只顯示 0
    assert_eq!(chains[2]["resolved"], false);
    assert_eq!(chains[2]["formatted_balance"], "0");

    // 1.5 ETH * 3000 + 1.5 AVAX * 20, MATIC has no feed
    assert_eq!(body["valuation"]["prices"], json!(["3000", "20", "0"]));
    assert_eq!(body["valuation"]["totalFormattedInUSD"], "4530");
}

#[tokio::test]
async fn unknown_domain_dashboard_is_empty() {
    let (status, body) = get_json(test_app(), "/api/dashboard/nobody.eth?refresh=true").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["chains"]
        .as_array()
        .unwrap()
        .iter()
        .all(|chain| chain["resolved"] == false));
    assert_eq!(body["valuation"]["totalBalanceInUSD"], "0");
}

#[tokio::test]
async fn onboarding_steps_navigate() {
    let (status, body) = get_json(test_app(), "/api/onboarding/steps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get_json(test_app(), "/api/onboarding/steps/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"]["shortTitle"], "Select Domain");
    assert_eq!(body["nextStepId"], "2");

    let (status, body) = get_json(test_app(), "/api/onboarding/steps/2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["nextStepId"].is_null());

    let (status, _) = get_json(test_app(), "/api/onboarding/steps/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
