//! Integration tests for the Bybit v5 REST client
//!
//! A local wiremock server stands in for `api.bybit.com` and serves canned
//! v5 envelopes, so these tests need no network access or real keys.

use grid_bot::bybit::rest::BybitRestClient;
use grid_bot::common::errors::ClientError;
use grid_bot::common::types::{OrderRequest, PositionMode, Side};
use grid_bot::config::types::ApiCredentials;
use grid_bot::ExchangeClient;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a client pointed at the mock server
fn create_test_client(server: &MockServer) -> BybitRestClient {
    BybitRestClient::new(&server.uri())
        .expect("Failed to create REST client")
        .with_credentials(ApiCredentials::new(
            "test_key".to_string(),
            "test_secret".to_string(),
        ))
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "retCode": 0,
        "retMsg": "OK",
        "result": result,
        "time": 1704067200000u64
    }))
}

fn api_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "retCode": code,
        "retMsg": message,
        "result": {}
    }))
}

// ============================================================================
// Market Data
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_get_instrument_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/instruments-info"))
        .and(query_param("category", "linear"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ok(json!({
            "category": "linear",
            "list": [{
                "symbol": "BTCUSDT",
                "lotSizeFilter": {"qtyStep": "0.001", "minOrderQty": "0.001", "maxOrderQty": "100.000"},
                "priceFilter": {"tickSize": "0.10", "minPrice": "0.10"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = create_test_client(&server)
        .get_instrument_info("BTCUSDT")
        .await
        .unwrap();

    assert_eq!(info.qty_step, dec!(0.001));
    assert_eq!(info.tick_size, dec!(0.1));
    assert_eq!(info.min_order_qty, dec!(0.001));
}

#[tokio::test]
async fn test_unknown_symbol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/instruments-info"))
        .respond_with(ok(json!({"category": "linear", "list": []})))
        .mount(&server)
        .await;

    let result = create_test_client(&server).get_instrument_info("NOPEUSDT").await;

    assert!(matches!(result, Err(ClientError::SymbolNotFound(ref s)) if s == "NOPEUSDT"));
}

#[tokio::test]
async fn test_get_last_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/market/tickers"))
        .and(query_param("symbol", "ETHUSDT"))
        .respond_with(ok(json!({
            "category": "linear",
            "list": [{"symbol": "ETHUSDT", "lastPrice": "2301.45", "bid1Price": "2301.40"}]
        })))
        .mount(&server)
        .await;

    let price = create_test_client(&server).get_last_price("ETHUSDT").await.unwrap();

    assert_eq!(price, dec!(2301.45));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = create_test_client(&server).get_last_price("BTCUSDT").await;

    assert!(matches!(result, Err(ClientError::InvalidResponse(ref msg)) if msg.contains("502")));
}

// ============================================================================
// Account Setup
// ============================================================================

#[tokio::test]
async fn test_switch_to_hedge_mode_is_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/position/switch-mode"))
        .and(header_exists("X-BAPI-API-KEY"))
        .and(header_exists("X-BAPI-SIGN"))
        .and(header_exists("X-BAPI-TIMESTAMP"))
        .and(header_exists("X-BAPI-RECV-WINDOW"))
        .and(body_partial_json(json!({"category": "linear", "symbol": "BTCUSDT", "mode": 3})))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    create_test_client(&server)
        .set_position_mode("BTCUSDT", PositionMode::Hedge)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_leverage_not_modified_carries_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/position/set-leverage"))
        .and(body_partial_json(json!({"buyLeverage": "10", "sellLeverage": "10"})))
        .respond_with(api_error(110043, "leverage not modified"))
        .mount(&server)
        .await;

    let err = create_test_client(&server)
        .set_leverage("BTCUSDT", dec!(10.0))
        .await
        .unwrap_err();

    assert_eq!(err.api_code(), Some(110043));
}

#[tokio::test]
async fn test_private_call_without_credentials() {
    let server = MockServer::start().await;
    let client = BybitRestClient::new(&server.uri()).unwrap();

    let result = client.cancel_all_orders("BTCUSDT").await;

    assert!(matches!(result, Err(ClientError::Authentication(_))));
}

// ============================================================================
// Positions and Orders
// ============================================================================

#[tokio::test]
async fn test_get_position_picks_hedge_leg() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/position/list"))
        .and(header_exists("X-BAPI-SIGN"))
        .respond_with(ok(json!({
            "category": "linear",
            "list": [
                {"symbol": "BTCUSDT", "side": "Buy", "size": "0.015", "avgPrice": "64210.5",
                 "leverage": "10", "positionIdx": 1},
                {"symbol": "BTCUSDT", "side": "", "size": "0", "avgPrice": "0",
                 "leverage": "10", "positionIdx": 2}
            ]
        })))
        .mount(&server)
        .await;
    let client = create_test_client(&server);

    let long = client.get_position("BTCUSDT", Side::Buy).await.unwrap();
    assert_eq!(long.size, dec!(0.015));
    assert_eq!(long.avg_price, dec!(64210.5));
    assert_eq!(long.leverage, dec!(10));
    assert_eq!(long.side, Side::Buy);

    let short = client.get_position("BTCUSDT", Side::Sell).await.unwrap();
    assert!(short.is_flat());
    assert_eq!(short.side, Side::Sell);
}

#[tokio::test]
async fn test_get_open_orders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/order/realtime"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ok(json!({
            "category": "linear",
            "list": [
                {"orderId": "a1", "orderLinkId": "", "side": "Buy", "price": "61000.0",
                 "qty": "0.016", "reduceOnly": false},
                {"orderId": "b2", "orderLinkId": "tp_Ab12Cd34", "side": "Sell", "price": "65494.7",
                 "qty": "0.015", "reduceOnly": true}
            ]
        })))
        .mount(&server)
        .await;

    let orders = create_test_client(&server)
        .get_open_orders("BTCUSDT")
        .await
        .unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].correlation_id, None);
    assert!(!orders[0].reduce_only);
    assert_eq!(orders[1].correlation_id.as_deref(), Some("tp_Ab12Cd34"));
    assert_eq!(orders[1].side, Side::Sell);
    assert_eq!(orders[1].price, dec!(65494.7));
}

#[tokio::test]
async fn test_place_take_profit_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/order/create"))
        .and(body_partial_json(json!({
            "category": "linear",
            "symbol": "BTCUSDT",
            "side": "Sell",
            "orderType": "Limit",
            "qty": "0.015",
            "price": "65494.7",
            "reduceOnly": true,
            "positionIdx": 1,
            "orderLinkId": "tp_Ab12Cd34"
        })))
        .respond_with(ok(json!({"orderId": "b2", "orderLinkId": "tp_Ab12Cd34"})))
        .expect(1)
        .mount(&server)
        .await;

    let order = OrderRequest::take_profit("BTCUSDT", Side::Buy, dec!(0.015), dec!(65494.7), "tp_Ab12Cd34");
    let ack = create_test_client(&server).place_order(&order).await.unwrap();

    assert!(ack.accepted);
    assert!(ack.message.contains("b2"));
}

#[tokio::test]
async fn test_rejected_order_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/order/create"))
        .respond_with(api_error(110007, "ab not enough for new order"))
        .mount(&server)
        .await;

    let order = OrderRequest::market("BTCUSDT", Side::Sell, dec!(0.5));
    let ack = create_test_client(&server).place_order(&order).await.unwrap();

    assert!(!ack.accepted);
    assert!(ack.message.contains("110007"));
}

#[tokio::test]
async fn test_cancel_order_by_link_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/order/cancel"))
        .and(body_partial_json(json!({"symbol": "BTCUSDT", "orderLinkId": "tp_Ab12Cd34"})))
        .respond_with(ok(json!({"orderId": "b2", "orderLinkId": "tp_Ab12Cd34"})))
        .expect(1)
        .mount(&server)
        .await;

    create_test_client(&server)
        .cancel_order("BTCUSDT", "tp_Ab12Cd34")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancel_all_orders() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/order/cancel-all"))
        .and(body_partial_json(json!({"category": "linear", "symbol": "BTCUSDT"})))
        .respond_with(ok(json!({"list": [], "success": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    create_test_client(&server)
        .cancel_all_orders("BTCUSDT")
        .await
        .unwrap();
}
