//! REST API client for Bybit v5 linear perpetuals

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::auth::{generate_auth_headers, AuthHeaders};
use super::messages::*;
use crate::common::errors::{ClientError, Result};
use crate::common::traits::ExchangeClient;
use crate::common::types::{
    InstrumentInfo, OpenOrder, OrderAck, OrderRequest, PositionMode, PositionSnapshot, Side,
};
use crate::config::types::ApiCredentials;

/// Default signature validity window
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

/// REST API client for Bybit
#[derive(Debug, Clone)]
pub struct BybitRestClient {
    /// HTTP client
    client: Client,
    /// Base URL for the v5 API
    base_url: String,
    /// API credentials for private endpoints
    credentials: Option<ApiCredentials>,
    recv_window_ms: u64,
}

impl BybitRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        })
    }

    /// Set API credentials for private requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    /// Generate authentication headers for a signed payload
    fn auth_headers(&self, payload: &str) -> Result<AuthHeaders> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            ClientError::Authentication("API credentials required for private endpoint".to_string())
        })?;
        generate_auth_headers(&creds.api_key, &creds.api_secret, self.recv_window_ms, payload)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// GET `path` and unwrap the `result` of a successful envelope
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        signed: bool,
    ) -> Result<T> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        let url = format!("{}{}?{}", self.base_url, path, query);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if signed {
            request = self.auth_headers(&query)?.apply_to_request(request);
        }
        let envelope = Self::read_envelope(request.send().await?).await?;
        Self::into_result(envelope)
    }

    /// POST a signed JSON body and return the raw envelope
    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let payload = serde_json::to_string(body)?;
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} {}", url, payload);

        let request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.clone());
        let request = self.auth_headers(&payload)?.apply_to_request(request);
        Self::read_envelope(request.send().await?).await
    }

    /// POST and fail on a non-zero return code
    async fn post_checked<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let envelope = self.post(path, body).await?;
        Self::check(&envelope)
    }

    async fn read_envelope(response: reqwest::Response) -> Result<ApiResponse> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }
        Ok(response.json().await?)
    }

    fn check(envelope: &ApiResponse) -> Result<()> {
        if envelope.ret_code == 0 {
            Ok(())
        } else {
            Err(ClientError::Api {
                code: envelope.ret_code,
                message: envelope.ret_msg.clone(),
            })
        }
    }

    fn into_result<T: DeserializeOwned>(envelope: ApiResponse) -> Result<T> {
        Self::check(&envelope)?;
        Ok(serde_json::from_value(envelope.result)?)
    }
}

#[async_trait]
impl ExchangeClient for BybitRestClient {
    #[instrument(skip(self))]
    async fn get_instrument_info(&self, symbol: &str) -> Result<InstrumentInfo> {
        let result: ListResult<InstrumentEntry> = self
            .get(
                "/v5/market/instruments-info",
                &[("category", CATEGORY_LINEAR), ("symbol", symbol)],
                false,
            )
            .await?;

        let entry = result
            .list
            .into_iter()
            .find(|entry| entry.symbol == symbol)
            .ok_or_else(|| ClientError::SymbolNotFound(symbol.to_string()))?;

        Ok(InstrumentInfo {
            qty_step: parse_decimal("qtyStep", &entry.lot_size_filter.qty_step)?,
            tick_size: parse_decimal("tickSize", &entry.price_filter.tick_size)?,
            min_order_qty: parse_decimal("minOrderQty", &entry.lot_size_filter.min_order_qty)?,
        })
    }

    #[instrument(skip(self))]
    async fn set_position_mode(&self, symbol: &str, mode: PositionMode) -> Result<()> {
        let body = SwitchModeRequest {
            category: CATEGORY_LINEAR,
            symbol,
            mode: match mode {
                PositionMode::OneWay => 0,
                PositionMode::Hedge => 3,
            },
        };
        self.post_checked("/v5/position/switch-mode", &body).await
    }

    #[instrument(skip(self))]
    async fn set_leverage(&self, symbol: &str, leverage: Decimal) -> Result<()> {
        let leverage = leverage.normalize().to_string();
        let body = SetLeverageRequest {
            category: CATEGORY_LINEAR,
            symbol,
            buy_leverage: leverage.clone(),
            sell_leverage: leverage,
        };
        self.post_checked("/v5/position/set-leverage", &body).await
    }

    #[instrument(skip(self))]
    async fn cancel_all_orders(&self, symbol: &str) -> Result<()> {
        let body = CancelAllRequest {
            category: CATEGORY_LINEAR,
            symbol,
        };
        self.post_checked("/v5/order/cancel-all", &body).await
    }

    #[instrument(skip(self))]
    async fn get_position(&self, symbol: &str, side: Side) -> Result<PositionSnapshot> {
        let result: ListResult<PositionEntry> = self
            .get(
                "/v5/position/list",
                &[("category", CATEGORY_LINEAR), ("symbol", symbol)],
                true,
            )
            .await?;

        let entry = result
            .list
            .into_iter()
            .find(|entry| entry.position_idx == side.position_idx() || entry.side == side.to_string());
        let Some(entry) = entry else {
            return Ok(PositionSnapshot::flat(side));
        };

        let size = parse_decimal("size", &entry.size)?;
        if size.is_zero() {
            return Ok(PositionSnapshot::flat(side));
        }

        Ok(PositionSnapshot {
            size,
            avg_price: parse_decimal_or_zero("avgPrice", &entry.avg_price)?,
            side: parse_side(&entry.side).unwrap_or(side),
            leverage: parse_decimal_or_zero("leverage", &entry.leverage)?,
        })
    }

    #[instrument(skip(self))]
    async fn get_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>> {
        let result: ListResult<OrderEntry> = self
            .get(
                "/v5/order/realtime",
                &[("category", CATEGORY_LINEAR), ("symbol", symbol)],
                true,
            )
            .await?;

        result
            .list
            .into_iter()
            .map(|entry| {
                let side = parse_side(&entry.side).ok_or_else(|| {
                    ClientError::InvalidResponse(format!("Invalid order side: {}", entry.side))
                })?;
                Ok(OpenOrder {
                    correlation_id: Some(entry.order_link_id).filter(|id| !id.is_empty()),
                    order_id: entry.order_id,
                    side,
                    price: parse_decimal_or_zero("price", &entry.price)?,
                    qty: parse_decimal("qty", &entry.qty)?,
                    reduce_only: entry.reduce_only,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn get_last_price(&self, symbol: &str) -> Result<Decimal> {
        let result: ListResult<TickerEntry> = self
            .get(
                "/v5/market/tickers",
                &[("category", CATEGORY_LINEAR), ("symbol", symbol)],
                false,
            )
            .await?;

        let ticker = result
            .list
            .into_iter()
            .find(|ticker| ticker.symbol == symbol)
            .ok_or_else(|| ClientError::SymbolNotFound(symbol.to_string()))?;
        parse_decimal("lastPrice", &ticker.last_price)
    }

    /// A non-zero return code is a rejection, not an error
    #[instrument(skip(self, order), fields(order = %order))]
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let body = CreateOrderRequest {
            category: CATEGORY_LINEAR,
            symbol: &order.symbol,
            side: order.side.to_string(),
            order_type: order.order_type.to_string(),
            qty: order.qty.to_string(),
            price: order.price.map(|price| price.to_string()),
            reduce_only: order.reduce_only,
            position_idx: order.position_side.position_idx(),
            order_link_id: order.correlation_id.as_deref(),
        };

        let envelope = self.post("/v5/order/create", &body).await?;
        if envelope.ret_code != 0 {
            return Ok(OrderAck::rejected(format!(
                "{} ({})",
                envelope.ret_msg, envelope.ret_code
            )));
        }

        let order_id = envelope
            .result
            .get("orderId")
            .and_then(|id| id.as_str())
            .unwrap_or_default();
        Ok(OrderAck::accepted(format!("{} orderId={}", envelope.ret_msg, order_id)))
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, symbol: &str, correlation_id: &str) -> Result<()> {
        let body = CancelOrderRequest {
            category: CATEGORY_LINEAR,
            symbol,
            order_link_id: correlation_id,
        };
        self.post_checked("/v5/order/cancel", &body).await
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    value
        .parse()
        .map_err(|e| ClientError::InvalidResponse(format!("Invalid {} '{}': {}", field, value, e)))
}

/// Like [`parse_decimal`], but an empty field reads as zero
fn parse_decimal_or_zero(field: &str, value: &str) -> Result<Decimal> {
    if value.is_empty() {
        Ok(Decimal::ZERO)
    } else {
        parse_decimal(field, value)
    }
}

fn parse_side(value: &str) -> Option<Side> {
    match value {
        "Buy" => Some(Side::Buy),
        "Sell" => Some(Side::Sell),
        _ => None,
    }
}
