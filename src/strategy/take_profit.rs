use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;

use crate::common::types::{OpenOrder, PositionSnapshot, Side};

/// Prefix of every take-profit correlation id
pub const TAKE_PROFIT_PREFIX: &str = "tp_";

const SUFFIX_LEN: usize = 8;

/// Target take-profit price
///
/// long: avg * (1 + rate/100/leverage), short: avg * (1 - rate/100/leverage)
pub fn target_price(side: Side, avg_price: Decimal, rate_percent: Decimal, leverage: Decimal) -> Decimal {
    if leverage <= Decimal::ZERO {
        return avg_price;
    }
    let offset = rate_percent / Decimal::ONE_HUNDRED / leverage;
    match side {
        Side::Buy => avg_price * (Decimal::ONE + offset),
        Side::Sell => avg_price * (Decimal::ONE - offset),
    }
}

/// Fresh client correlation id, e.g. `tp_a8Xk2PqZ`
pub fn new_correlation_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", TAKE_PROFIT_PREFIX, suffix)
}

/// Size and average price recorded when the take-profit was last placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedPosition {
    pub size: Decimal,
    pub avg_price: Decimal,
}

/// Tracks the single live take-profit order of a position lifecycle
///
/// At most one correlation id is tracked. Replacement is always
/// cancel-then-recreate: the handle is cleared before a new order is
/// submitted and only adopted once the exchange accepts it.
#[derive(Debug, Default)]
pub struct TakeProfitManager {
    handle: Option<String>,
    last_observed: Option<ObservedPosition>,
}

impl TakeProfitManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_observed(&self) -> Option<ObservedPosition> {
        self.last_observed
    }

    /// Forget the tracked order and the observed position
    pub fn reset(&mut self) {
        self.handle = None;
        self.last_observed = None;
    }

    /// The tracked order, if it is still resting on the exchange
    pub fn find_live<'a>(&self, open_orders: &'a [OpenOrder]) -> Option<&'a OpenOrder> {
        let handle = self.handle.as_deref()?;
        open_orders
            .iter()
            .find(|order| order.correlation_id.as_deref() == Some(handle))
    }

    /// Size or average price differs from the last observation
    ///
    /// True when nothing has been observed yet.
    pub fn position_changed(&self, position: &PositionSnapshot) -> bool {
        match self.last_observed {
            Some(last) => last.size != position.size || last.avg_price != position.avg_price,
            None => true,
        }
    }

    /// A ladder rung filled since the last observation of this position
    pub fn was_averaged(&self, position: &PositionSnapshot) -> bool {
        self.last_observed.is_some() && self.position_changed(position)
    }

    /// Whether the take-profit has to be (re)placed
    pub fn needs_replace(&self, position: &PositionSnapshot, open_orders: &[OpenOrder]) -> bool {
        self.find_live(open_orders).is_none() || self.position_changed(position)
    }

    /// Drop the tracked id ahead of a replacement
    pub fn take_handle(&mut self) -> Option<String> {
        self.handle.take()
    }

    /// Track a newly accepted order
    pub fn adopt(&mut self, correlation_id: String) {
        self.handle = Some(correlation_id);
    }

    /// Record the position the current take-profit was sized for
    pub fn observe(&mut self, position: &PositionSnapshot) {
        self.last_observed = Some(ObservedPosition {
            size: position.size,
            avg_price: position.avg_price,
        });
    }
}
