//! Order sizing, ladder planning and take-profit bookkeeping
//!
//! These pieces are pure: they never talk to the exchange. The engine
//! feeds them observed state and submits what they compute.
//!
//! - [`InstrumentRules`]: rounding and minimum-size rules for a symbol
//! - [`OrderSizer`]: notional budget + leverage + price -> order quantity
//! - [`plan_ladder`]: cumulative rung prices for the entry ladder
//! - [`TakeProfitManager`]: the single tracked take-profit correlation id

mod instrument;
mod ladder;
mod sizer;
mod take_profit;

pub use instrument::{precision_of, InstrumentRules, Sizing};

pub use ladder::{next_rung_price, plan_ladder, Rung};

pub use sizer::OrderSizer;

pub use take_profit::{
    new_correlation_id, target_price, ObservedPosition, TakeProfitManager, TAKE_PROFIT_PREFIX,
};
