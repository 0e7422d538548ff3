//! Unified types shared by the engine and exchange clients

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side, also used to name the direction of a hedge-mode position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(alias = "buy", alias = "BUY", alias = "long", alias = "Long")]
    Buy,
    #[serde(alias = "sell", alias = "SELL", alias = "short", alias = "Short")]
    Sell,
}

impl Side {
    /// The side that closes a position opened on this side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Hedge-mode position index (1 = long, 2 = short)
    pub fn position_idx(self) -> u8 {
        match self {
            Side::Buy => 1,
            Side::Sell => 2,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "Market"),
            OrderType::Limit => write!(f, "Limit"),
        }
    }
}

/// Account position mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionMode {
    OneWay,
    Hedge,
}

/// Order submission request
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: Decimal,
    /// Limit price; `None` for market orders
    pub price: Option<Decimal>,
    pub reduce_only: bool,
    /// Hedge-mode position the order applies to
    pub position_side: Side,
    /// Client-generated correlation id
    pub correlation_id: Option<String>,
}

impl OrderRequest {
    /// Market entry order for a position on `side`
    pub fn market(symbol: impl Into<String>, side: Side, qty: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            qty,
            price: None,
            reduce_only: false,
            position_side: side,
            correlation_id: None,
        }
    }

    /// Resting limit entry order for a position on `side`
    pub fn limit(symbol: impl Into<String>, side: Side, qty: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            qty,
            price: Some(price),
            reduce_only: false,
            position_side: side,
            correlation_id: None,
        }
    }

    /// Reduce-only limit order closing a position held on `position_side`
    pub fn take_profit(
        symbol: impl Into<String>,
        position_side: Side,
        qty: Decimal,
        price: Decimal,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: position_side.opposite(),
            order_type: OrderType::Limit,
            qty,
            price: Some(price),
            reduce_only: true,
            position_side,
            correlation_id: Some(correlation_id.into()),
        }
    }
}

impl std::fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} qty={}", self.symbol, self.order_type, self.side, self.qty)?;
        if let Some(price) = self.price {
            write!(f, " price={}", price)?;
        }
        if self.reduce_only {
            write!(f, " reduce-only")?;
        }
        if let Some(id) = &self.correlation_id {
            write!(f, " link={}", id)?;
        }
        Ok(())
    }
}

/// Exchange verdict on a submitted order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub accepted: bool,
    pub message: String,
}

impl OrderAck {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
        }
    }
}

/// An order resting on the exchange
#[derive(Debug, Clone, PartialEq)]
pub struct OpenOrder {
    pub order_id: String,
    pub correlation_id: Option<String>,
    pub side: Side,
    pub price: Decimal,
    pub qty: Decimal,
    pub reduce_only: bool,
}

/// Position state as observed on one tick
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    pub size: Decimal,
    pub avg_price: Decimal,
    pub side: Side,
    pub leverage: Decimal,
}

impl PositionSnapshot {
    /// Flat position on `side`
    pub fn flat(side: Side) -> Self {
        Self {
            size: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            side,
            leverage: Decimal::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size <= Decimal::ZERO
    }
}

/// Raw instrument filters as reported by the exchange
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentInfo {
    pub qty_step: Decimal,
    pub tick_size: Decimal,
    pub min_order_qty: Decimal,
}
