//! Collaborator traits consumed by the engine

use async_trait::async_trait;
use rust_decimal::Decimal;

#[cfg(test)]
use mockall::automock;

use super::errors::Result;
use super::types::{InstrumentInfo, OpenOrder, OrderAck, OrderRequest, PositionMode, PositionSnapshot, Side};

/// Exchange operations the reconciliation engine relies on
///
/// Implementations are shared between the background worker and the
/// control surface, so every method takes `&self`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Trading filters for a symbol; `SymbolNotFound` if unknown
    async fn get_instrument_info(&self, symbol: &str) -> Result<InstrumentInfo>;

    /// Switch the account position mode for a symbol
    async fn set_position_mode(&self, symbol: &str, mode: PositionMode) -> Result<()>;

    /// Set buy and sell leverage for a symbol
    async fn set_leverage(&self, symbol: &str, leverage: Decimal) -> Result<()>;

    /// Cancel every open order on a symbol
    async fn cancel_all_orders(&self, symbol: &str) -> Result<()>;

    /// Hedge-mode position held on `side` (size may be zero)
    async fn get_position(&self, symbol: &str, side: Side) -> Result<PositionSnapshot>;

    /// Orders currently resting on a symbol
    async fn get_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>>;

    /// Last traded price
    async fn get_last_price(&self, symbol: &str) -> Result<Decimal>;

    /// Submit an order
    ///
    /// An exchange refusal is an `OrderAck` with `accepted == false`,
    /// not an error.
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck>;

    /// Cancel an order by its client correlation id
    async fn cancel_order(&self, symbol: &str, correlation_id: &str) -> Result<()>;
}

/// Best-effort alerting on position lifecycle events
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}
