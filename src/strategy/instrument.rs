use rust_decimal::{Decimal, RoundingStrategy};

use crate::common::types::InstrumentInfo;

/// Per-symbol rounding and validation rules
///
/// Loaded once per run and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentRules {
    pub qty_step: Decimal,
    pub tick_size: Decimal,
    pub min_order_qty: Decimal,
    /// Decimal places allowed in a quantity
    pub qty_precision: u32,
    /// Decimal places allowed in a price
    pub price_precision: u32,
}

/// Result of conforming a quantity/price pair to the instrument rules
#[derive(Debug, Clone, PartialEq)]
pub enum Sizing {
    /// Rounded values, ready to submit
    Sized { qty: Decimal, price: Decimal },
    /// Rounded quantity is under the exchange minimum; nothing is submitted
    BelowMinimum { qty: Decimal, min_qty: Decimal },
}

impl InstrumentRules {
    pub fn new(qty_step: Decimal, tick_size: Decimal, min_order_qty: Decimal) -> Self {
        Self {
            qty_step,
            tick_size,
            min_order_qty,
            qty_precision: precision_of(qty_step),
            price_precision: precision_of(tick_size),
        }
    }

    pub fn round_qty(&self, qty: Decimal) -> Decimal {
        round_to(qty, self.qty_precision)
    }

    pub fn round_price(&self, price: Decimal) -> Decimal {
        round_to(price, self.price_precision)
    }

    /// Round both values and enforce the minimum order quantity
    pub fn conform(&self, qty: Decimal, price: Decimal) -> Sizing {
        let qty = self.round_qty(qty);
        if qty < self.min_order_qty {
            return Sizing::BelowMinimum {
                qty,
                min_qty: self.min_order_qty,
            };
        }
        Sizing::Sized {
            qty,
            price: self.round_price(price),
        }
    }
}

impl From<InstrumentInfo> for InstrumentRules {
    fn from(info: InstrumentInfo) -> Self {
        Self::new(info.qty_step, info.tick_size, info.min_order_qty)
    }
}

impl std::fmt::Display for InstrumentRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "qty_step={} tick_size={} min_qty={} qty_dp={} price_dp={}",
            self.qty_step,
            self.tick_size,
            self.min_order_qty,
            self.qty_precision,
            self.price_precision
        )
    }
}

/// Number of decimal places in a step size (0.001 -> 3, 0.5 -> 1, 10 -> 0)
pub fn precision_of(step: Decimal) -> u32 {
    if step <= Decimal::ZERO {
        return 0;
    }
    step.normalize().scale()
}

fn round_to(value: Decimal, dp: u32) -> Decimal {
    value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_rules() -> InstrumentRules {
        InstrumentRules::new(dec!(0.001), dec!(0.10), dec!(0.001))
    }

    #[test]
    fn test_precision_from_step() {
        assert_eq!(precision_of(dec!(0.001)), 3);
        assert_eq!(precision_of(dec!(0.10)), 1);
        assert_eq!(precision_of(dec!(0.5)), 1);
        assert_eq!(precision_of(dec!(1)), 0);
        assert_eq!(precision_of(dec!(10)), 0);
        assert_eq!(precision_of(dec!(0)), 0);
    }

    #[test]
    fn test_rounding() {
        let rules = btc_rules();
        assert_eq!(rules.round_qty(dec!(0.0123456)), dec!(0.012));
        assert_eq!(rules.round_price(dec!(64123.456)), dec!(64123.5));
        // Half-even at the midpoint
        assert_eq!(rules.round_qty(dec!(0.0125)), dec!(0.012));
    }

    #[test]
    fn test_conform_rejects_below_minimum() {
        let rules = InstrumentRules::new(dec!(0.01), dec!(0.01), dec!(0.05));
        assert_eq!(
            rules.conform(dec!(0.044), dec!(100)),
            Sizing::BelowMinimum {
                qty: dec!(0.04),
                min_qty: dec!(0.05)
            }
        );
        assert_eq!(
            rules.conform(dec!(0.054), dec!(100.004)),
            Sizing::Sized {
                qty: dec!(0.05),
                price: dec!(100)
            }
        );
    }

    #[test]
    fn test_from_instrument_info() {
        let rules: InstrumentRules = InstrumentInfo {
            qty_step: dec!(0.01),
            tick_size: dec!(0.0001),
            min_order_qty: dec!(0.1),
        }
        .into();
        assert_eq!(rules.qty_precision, 2);
        assert_eq!(rules.price_precision, 4);
    }
}
