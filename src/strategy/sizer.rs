use rust_decimal::Decimal;

use super::instrument::{InstrumentRules, Sizing};

/// Converts a notional budget into an exchange-valid order size
///
/// quantity = (notional * leverage) / price, then rounded and checked
/// against the instrument minimum.
#[derive(Debug, Clone, Copy)]
pub struct OrderSizer<'a> {
    rules: &'a InstrumentRules,
}

impl<'a> OrderSizer<'a> {
    pub fn new(rules: &'a InstrumentRules) -> Self {
        Self { rules }
    }

    /// Unrounded quantity; zero for a non-positive price
    pub fn quantity(notional: Decimal, leverage: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        notional * leverage / price
    }

    /// Size an order at `price`
    pub fn size(&self, notional: Decimal, leverage: Decimal, price: Decimal) -> Sizing {
        self.rules
            .conform(Self::quantity(notional, leverage, price), price)
    }
}
