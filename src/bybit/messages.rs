//! Bybit v5 REST payloads

use serde::{Deserialize, Serialize};

/// Product category used for every request
pub const CATEGORY_LINEAR: &str = "linear";

/// Response envelope shared by all v5 endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Generic `{ "list": [...] }` result
#[derive(Debug, Clone, Deserialize)]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
}

/// Instrument entry from `/v5/market/instruments-info`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentEntry {
    pub symbol: String,
    pub lot_size_filter: LotSizeFilter,
    pub price_filter: PriceFilter,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSizeFilter {
    pub qty_step: String,
    pub min_order_qty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    pub tick_size: String,
}

/// Position entry from `/v5/position/list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEntry {
    pub symbol: String,
    /// "Buy", "Sell", or empty/"None" when flat
    #[serde(default)]
    pub side: String,
    pub size: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub leverage: String,
    #[serde(default)]
    pub position_idx: u8,
}

/// Order entry from `/v5/order/realtime`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub order_id: String,
    #[serde(default)]
    pub order_link_id: String,
    pub side: String,
    #[serde(default)]
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub reduce_only: bool,
}

/// Ticker entry from `/v5/market/tickers`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub symbol: String,
    pub last_price: String,
}

/// Body of `/v5/position/switch-mode`
#[derive(Debug, Clone, Serialize)]
pub struct SwitchModeRequest<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
    /// 0 = one-way, 3 = hedge
    pub mode: u8,
}

/// Body of `/v5/position/set-leverage`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLeverageRequest<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
    pub buy_leverage: String,
    pub sell_leverage: String,
}

/// Body of `/v5/order/cancel-all`
#[derive(Debug, Clone, Serialize)]
pub struct CancelAllRequest<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
}

/// Body of `/v5/order/cancel`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
    pub order_link_id: &'a str,
}

/// Body of `/v5/order/create`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest<'a> {
    pub category: &'a str,
    pub symbol: &'a str,
    pub side: String,
    pub order_type: String,
    pub qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reduce_only: bool,
    pub position_idx: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_link_id: Option<&'a str>,
}
