//! Common test utilities and fixtures

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use grid_bot::common::errors::{ClientError, Result};
use grid_bot::common::types::{
    InstrumentInfo, OpenOrder, OrderAck, OrderRequest, OrderType, PositionMode, PositionSnapshot,
    Side,
};
use grid_bot::config::types::{BotConfig, LadderStep};
use grid_bot::{ExchangeClient, Notifier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const SYMBOL: &str = "BTCUSDT";

/// Long grid: 50 USDT x10 per rung, rungs 5% apart, 20% take-profit
pub fn long_config() -> BotConfig {
    BotConfig {
        symbol: SYMBOL.to_string(),
        side: Side::Buy,
        leverage: dec!(10),
        steps: vec![
            LadderStep::new(dec!(50), dec!(0)),
            LadderStep::new(dec!(50), dec!(5)),
            LadderStep::new(dec!(50), dec!(5)),
        ],
        take_profit_percent: dec!(20),
        loop_forever: false,
        enter_at_market: true,
    }
}

/// Mutable exchange state behind [`FakeExchange`]
#[derive(Debug)]
pub struct FakeState {
    pub instrument: InstrumentInfo,
    pub last_price: Decimal,
    pub position: PositionSnapshot,
    pub open_orders: Vec<OpenOrder>,
    /// Every order submitted, accepted or not
    pub placed: Vec<OrderRequest>,
    /// Correlation ids passed to `cancel_order`
    pub cancelled: Vec<String>,
    pub cancel_all_calls: usize,
    pub instrument_calls: usize,
    pub position_calls: usize,
    /// Upcoming `get_position` calls that fail
    pub failing_position_calls: usize,
    /// Upcoming `cancel_all_orders` calls that fail
    pub failing_cancel_all_calls: usize,
    /// Latency of `cancel_all_orders`
    pub cancel_all_delay: Option<Duration>,
    pub position_mode_error: Option<i64>,
    pub leverage_error: Option<i64>,
    pub reject_orders: bool,
    next_order_id: u64,
}

/// In-memory exchange: market orders fill at the last price, limit
/// orders rest until a test fills them
#[derive(Debug)]
pub struct FakeExchange {
    state: Mutex<FakeState>,
}

impl FakeExchange {
    pub fn new(last_price: Decimal) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                instrument: InstrumentInfo {
                    qty_step: dec!(0.001),
                    tick_size: dec!(0.01),
                    min_order_qty: dec!(0.001),
                },
                last_price,
                position: PositionSnapshot::flat(Side::Buy),
                open_orders: Vec::new(),
                placed: Vec::new(),
                cancelled: Vec::new(),
                cancel_all_calls: 0,
                instrument_calls: 0,
                position_calls: 0,
                failing_position_calls: 0,
                failing_cancel_all_calls: 0,
                cancel_all_delay: None,
                position_mode_error: None,
                leverage_error: None,
                reject_orders: false,
                next_order_id: 1,
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Fill the resting entry order at `price`
    pub fn fill_limit_at(&self, price: Decimal) {
        let mut state = self.state();
        let index = state
            .open_orders
            .iter()
            .position(|order| !order.reduce_only && order.price == price)
            .expect("no resting entry order at that price");
        let order = state.open_orders.remove(index);
        state.apply_fill(order.side, order.qty, order.price);
    }

    /// Fill the resting take-profit, closing the position
    pub fn fill_take_profit(&self) {
        let mut state = self.state();
        state.open_orders.retain(|order| !order.reduce_only);
        let side = state.position.side;
        state.position = PositionSnapshot::flat(side);
    }

    pub fn take_profits(&self) -> Vec<OpenOrder> {
        self.state()
            .open_orders
            .iter()
            .filter(|order| order.reduce_only)
            .cloned()
            .collect()
    }

    pub fn placed_limits(&self) -> Vec<OrderRequest> {
        self.state()
            .placed
            .iter()
            .filter(|order| order.order_type == OrderType::Limit && !order.reduce_only)
            .cloned()
            .collect()
    }
}

impl FakeState {
    fn apply_fill(&mut self, side: Side, qty: Decimal, price: Decimal) {
        let position = &mut self.position;
        let total = position.size + qty;
        position.avg_price = (position.size * position.avg_price + qty * price) / total;
        position.size = total;
        position.side = side;
        position.leverage = dec!(10);
    }

    fn api_error(code: i64) -> ClientError {
        ClientError::Api {
            code,
            message: format!("error {}", code),
        }
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    async fn get_instrument_info(&self, symbol: &str) -> Result<InstrumentInfo> {
        let mut state = self.state();
        state.instrument_calls += 1;
        if symbol != SYMBOL {
            return Err(ClientError::SymbolNotFound(symbol.to_string()));
        }
        Ok(state.instrument.clone())
    }

    async fn set_position_mode(&self, _symbol: &str, _mode: PositionMode) -> Result<()> {
        match self.state().position_mode_error {
            Some(code) => Err(FakeState::api_error(code)),
            None => Ok(()),
        }
    }

    async fn set_leverage(&self, _symbol: &str, _leverage: Decimal) -> Result<()> {
        match self.state().leverage_error {
            Some(code) => Err(FakeState::api_error(code)),
            None => Ok(()),
        }
    }

    async fn cancel_all_orders(&self, _symbol: &str) -> Result<()> {
        let delay = self.state().cancel_all_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.cancel_all_calls += 1;
        if state.failing_cancel_all_calls > 0 {
            state.failing_cancel_all_calls -= 1;
            return Err(ClientError::InvalidResponse("connection reset".to_string()));
        }
        state.open_orders.clear();
        Ok(())
    }

    async fn get_position(&self, _symbol: &str, side: Side) -> Result<PositionSnapshot> {
        let mut state = self.state();
        state.position_calls += 1;
        if state.failing_position_calls > 0 {
            state.failing_position_calls -= 1;
            return Err(ClientError::InvalidResponse("connection reset".to_string()));
        }
        if state.position.is_flat() || state.position.side != side {
            return Ok(PositionSnapshot::flat(side));
        }
        Ok(state.position.clone())
    }

    async fn get_open_orders(&self, _symbol: &str) -> Result<Vec<OpenOrder>> {
        Ok(self.state().open_orders.clone())
    }

    async fn get_last_price(&self, _symbol: &str) -> Result<Decimal> {
        Ok(self.state().last_price)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let mut state = self.state();
        state.placed.push(order.clone());
        if state.reject_orders {
            return Ok(OrderAck::rejected("insufficient balance (110007)"));
        }

        let order_id = state.next_order_id.to_string();
        state.next_order_id += 1;

        match order.order_type {
            OrderType::Market => {
                let price = state.last_price;
                state.apply_fill(order.side, order.qty, price);
            }
            OrderType::Limit => state.open_orders.push(OpenOrder {
                order_id: order_id.clone(),
                correlation_id: order.correlation_id.clone(),
                side: order.side,
                price: order.price.unwrap_or_default(),
                qty: order.qty,
                reduce_only: order.reduce_only,
            }),
        }
        Ok(OrderAck::accepted(format!("OK orderId={}", order_id)))
    }

    async fn cancel_order(&self, _symbol: &str, correlation_id: &str) -> Result<()> {
        let mut state = self.state();
        let before = state.open_orders.len();
        state
            .open_orders
            .retain(|order| order.correlation_id.as_deref() != Some(correlation_id));
        if state.open_orders.len() == before {
            return Err(FakeState::api_error(110001));
        }
        state.cancelled.push(correlation_id.to_string());
        Ok(())
    }
}

/// Notifier that records every alert
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::SeqCst);
        Arc::new(notifier)
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Notification("webhook unreachable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
