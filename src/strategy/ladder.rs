use rust_decimal::Decimal;

use crate::common::types::Side;
use crate::config::types::LadderStep;

/// A planned entry rung
#[derive(Debug, Clone, PartialEq)]
pub struct Rung {
    /// Zero-based position in the ladder
    pub index: usize,
    /// Unrounded limit price
    pub price: Decimal,
    pub notional: Decimal,
}

/// Plan rung prices for a ladder anchored at `base`
///
/// The first rung sits at `base`. Each later rung is offset by its gap
/// from the previous rung's price, below it for a long ladder and above
/// it for a short one, so gaps compound cumulatively.
pub fn plan_ladder(base: Decimal, side: Side, steps: &[LadderStep]) -> Vec<Rung> {
    let mut rungs = Vec::with_capacity(steps.len());
    let mut price = base;

    for (index, step) in steps.iter().enumerate() {
        if index > 0 {
            price = next_rung_price(price, side, step.gap_percent);
        }
        rungs.push(Rung {
            index,
            price,
            notional: step.notional,
        });
    }

    rungs
}

/// Price one gap away from `previous`, in the averaging direction for `side`
pub fn next_rung_price(previous: Decimal, side: Side, gap_percent: Decimal) -> Decimal {
    let gap = gap_percent / Decimal::ONE_HUNDRED;
    match side {
        Side::Buy => previous * (Decimal::ONE - gap),
        Side::Sell => previous * (Decimal::ONE + gap),
    }
}
