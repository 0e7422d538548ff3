//! Per-run reconciliation worker
//!
//! One [`Reconciler`] lives for exactly one run. Each tick it observes the
//! position and open orders, then either lays the entry ladder (flat) or
//! keeps a single take-profit order in line with the position (open).

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use super::state::{EngineSettings, RunState, StateCell};
use crate::common::errors::{BotError, ClientError};
use crate::common::log_buffer::LogBuffer;
use crate::common::shutdown::Shutdown;
use crate::common::traits::{ExchangeClient, Notifier};
use crate::common::types::{OpenOrder, OrderRequest, PositionMode, PositionSnapshot};
use crate::config::types::BotConfig;
use crate::strategy::{
    new_correlation_id, plan_ladder, target_price, InstrumentRules, OrderSizer, Sizing,
    TakeProfitManager,
};

/// Collaborators and shared state handed to each run
#[derive(Clone)]
pub(crate) struct RunContext {
    pub(crate) exchange: Arc<dyn ExchangeClient>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) logs: LogBuffer,
    pub(crate) state: StateCell,
    pub(crate) settings: EngineSettings,
}

/// What the loop does after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Sleep the regular interval and tick again
    Continue,
    /// The run ended naturally
    Finished,
}

pub(crate) struct Reconciler {
    ctx: RunContext,
    config: BotConfig,
    rules: InstrumentRules,
    take_profit: TakeProfitManager,
    shutdown: Shutdown,
    /// Entry ladder placed for the current cycle
    ladder_built: bool,
    /// A non-zero position was observed during the current cycle
    position_seen: bool,
}

impl Reconciler {
    /// Prepare the account for a run
    ///
    /// Loads instrument rules, switches to hedge mode, sets leverage and
    /// clears resting orders. Recognised "already configured" codes count
    /// as success; any other failure is a [`BotError::Setup`].
    pub(crate) async fn initialize(
        ctx: RunContext,
        config: BotConfig,
        shutdown: Shutdown,
    ) -> Result<Self, BotError> {
        let exchange = ctx.exchange.clone();
        let symbol = config.symbol.as_str();

        let info = exchange
            .get_instrument_info(symbol)
            .await
            .map_err(BotError::setup("loading instrument rules"))?;
        let rules = InstrumentRules::from(info);
        ctx.logs.info(format!("{} rules loaded: {}", symbol, rules));

        match exchange.set_position_mode(symbol, PositionMode::Hedge).await {
            Ok(()) => ctx.logs.info("account switched to hedge mode"),
            Err(e) if is_recognised(&e, &ctx.settings.hedge_mode_ok_codes) => {
                ctx.logs.info("account already in hedge mode")
            }
            Err(e) => return Err(BotError::setup("switching to hedge mode")(e)),
        }

        match exchange.set_leverage(symbol, config.leverage).await {
            Ok(()) => ctx.logs.info(format!("leverage set to {}x", config.leverage)),
            Err(e) if is_recognised(&e, &ctx.settings.leverage_ok_codes) => ctx
                .logs
                .info(format!("leverage already {}x, skipping", config.leverage)),
            Err(e) => return Err(BotError::setup("setting leverage")(e)),
        }

        exchange
            .cancel_all_orders(symbol)
            .await
            .map_err(BotError::setup("cancelling open orders"))?;
        ctx.logs.info("cancelled all open orders before start");

        Ok(Self {
            ctx,
            config,
            rules,
            take_profit: TakeProfitManager::new(),
            shutdown,
            ladder_built: false,
            position_seen: false,
        })
    }

    /// Tick until cancelled or the run finishes
    pub(crate) async fn run(mut self) {
        while !self.shutdown.is_cancelled() {
            let delay = match self.tick().await {
                Ok(TickOutcome::Continue) => self.ctx.settings.tick_interval,
                Ok(TickOutcome::Finished) => {
                    self.ctx.state.set(RunState::Stopped);
                    self.ctx.logs.info("run finished; bot stopped");
                    return;
                }
                Err(BotError::Cancelled) => break,
                Err(e) => {
                    self.ctx.logs.error(format!("tick failed: {}", e));
                    self.ctx.settings.error_backoff
                }
            };

            if !self.shutdown.sleep(delay).await {
                break;
            }
        }
        debug!("reconciliation worker for {} exiting", self.config.symbol);
    }

    /// One observe-then-act pass
    pub(crate) async fn tick(&mut self) -> Result<TickOutcome, BotError> {
        let symbol = self.config.symbol.clone();
        let position = self.ctx.exchange.get_position(&symbol, self.config.side).await?;
        let open_orders = self.ctx.exchange.get_open_orders(&symbol).await?;
        self.shutdown.checkpoint()?;

        if position.is_flat() {
            self.on_flat(&open_orders).await
        } else {
            self.on_position(&position, &open_orders).await?;
            Ok(TickOutcome::Continue)
        }
    }

    async fn on_flat(&mut self, open_orders: &[OpenOrder]) -> Result<TickOutcome, BotError> {
        self.ctx.state.set(RunState::AwaitingEntry);
        let symbol = self.config.symbol.clone();
        let mut stale_orders = !open_orders.is_empty();

        if self.position_seen {
            // Alert only once the leftovers are gone
            if stale_orders {
                self.ctx.logs.info("cancelling leftover orders");
                self.ctx.exchange.cancel_all_orders(&symbol).await?;
                stale_orders = false;
            }
            self.ctx.logs.info(format!("{} position closed by take-profit", symbol));
            self.notify("Position closed", &format!("{} position closed.", symbol))
                .await;
            self.position_seen = false;
            self.ladder_built = false;
            self.take_profit.reset();

            if !self.config.loop_forever {
                self.ctx.logs.info("looping is disabled; ending the run");
                return Ok(TickOutcome::Finished);
            }

            let cooldown = self.ctx.settings.cycle_cooldown;
            self.ctx
                .logs
                .info(format!("starting a new cycle in {}s", cooldown.as_secs()));
            if !self.shutdown.sleep(cooldown).await {
                return Err(BotError::Cancelled);
            }
        } else if self.ladder_built {
            if stale_orders {
                debug!("{} entry ladder resting ({} orders)", symbol, open_orders.len());
                return Ok(TickOutcome::Continue);
            }
            self.ctx
                .logs
                .warn("no entry orders left on the book; rebuilding the ladder");
        }

        if stale_orders {
            self.ctx
                .logs
                .info(format!("clearing {} stale orders before laying the ladder", open_orders.len()));
            self.ctx.exchange.cancel_all_orders(&symbol).await?;
        }

        self.take_profit.reset();
        self.ctx.logs.info("no position; placing entry ladder");
        self.build_ladder().await?;
        self.ladder_built = true;
        Ok(TickOutcome::Continue)
    }

    async fn build_ladder(&self) -> Result<(), BotError> {
        let symbol = self.config.symbol.as_str();
        let side = self.config.side;
        let leverage = self.config.leverage;
        let sizer = OrderSizer::new(&self.rules);

        let Some(first) = self.config.steps.first() else {
            return Ok(());
        };

        let last_price = self.ctx.exchange.get_last_price(symbol).await?;

        let base_price = if self.config.enter_at_market {
            let sizing = sizer.size(first.notional, leverage, last_price);
            if let Some((qty, _)) = self.sized(sizing, "market entry") {
                if self.submit(OrderRequest::market(symbol, side, qty)).await {
                    self.notify(
                        "Entry filled",
                        &format!("{} {} position entered at market.", symbol, side),
                    )
                    .await;
                }
            }

            if !self.shutdown.sleep(self.ctx.settings.fill_settle).await {
                return Err(BotError::Cancelled);
            }
            match self.ctx.exchange.get_position(symbol, side).await {
                Ok(position) if !position.is_flat() => position.avg_price,
                Ok(_) => last_price,
                Err(e) => {
                    self.ctx.logs.warn(format!(
                        "could not re-read position after market entry ({}); basing ladder on last price",
                        e
                    ));
                    last_price
                }
            }
        } else {
            let sizing = sizer.size(first.notional, leverage, last_price);
            if let Some((qty, price)) = self.sized(sizing, "entry rung 1") {
                self.submit(OrderRequest::limit(symbol, side, qty, price)).await;
            }
            last_price
        };
        self.ctx.logs.info(format!("ladder base price {}", base_price));

        for rung in plan_ladder(base_price, side, &self.config.steps).into_iter().skip(1) {
            self.shutdown.checkpoint()?;
            let sizing = sizer.size(rung.notional, leverage, rung.price);
            let label = format!("entry rung {}", rung.index + 1);
            if let Some((qty, price)) = self.sized(sizing, &label) {
                self.submit(OrderRequest::limit(symbol, side, qty, price)).await;
            }
        }
        Ok(())
    }

    async fn on_position(
        &mut self,
        position: &PositionSnapshot,
        open_orders: &[OpenOrder],
    ) -> Result<(), BotError> {
        self.ctx.state.set(RunState::PositionOpen);
        self.position_seen = true;
        let symbol = self.config.symbol.clone();
        self.ctx.logs.info(format!(
            "position open (size {}, avg {}); managing take-profit",
            position.size, position.avg_price
        ));

        let leverage = if position.leverage > Decimal::ZERO {
            position.leverage
        } else {
            self.config.leverage
        };
        let target = target_price(
            position.side,
            position.avg_price,
            self.config.take_profit_percent,
            leverage,
        );

        if self.take_profit.was_averaged(position) {
            let before = self
                .take_profit
                .last_observed()
                .map(|observed| observed.size)
                .unwrap_or_default();
            self.ctx.logs.info("ladder rung filled; position averaged");
            self.notify(
                "Ladder rung filled",
                &format!("{} position size changed {} -> {}.", symbol, before, position.size),
            )
            .await;
        }

        if !self.take_profit.needs_replace(position, open_orders) {
            self.ctx.logs.info("take-profit already in place");
            return Ok(());
        }

        let live_id = self
            .take_profit
            .find_live(open_orders)
            .and_then(|order| order.correlation_id.clone());
        if let Some(id) = live_id {
            self.ctx
                .logs
                .info(format!("position changed; cancelling take-profit {}", id));
            self.ctx.exchange.cancel_order(&symbol, &id).await?;
        }
        self.take_profit.take_handle();

        let correlation_id = new_correlation_id();
        let sizing = self.rules.conform(position.size, target);
        if let Some((qty, price)) = self.sized(sizing, "take-profit") {
            self.ctx
                .logs
                .info(format!("placing take-profit at {} for {}", price, qty));
            let order =
                OrderRequest::take_profit(&symbol, position.side, qty, price, correlation_id.clone());
            if self.submit(order).await {
                self.take_profit.adopt(correlation_id);
            }
        }
        self.take_profit.observe(position);
        Ok(())
    }

    /// Unwrap a sizing result, logging the skip when below minimum
    fn sized(&self, sizing: Sizing, label: &str) -> Option<(Decimal, Decimal)> {
        match sizing {
            Sizing::Sized { qty, price } => Some((qty, price)),
            Sizing::BelowMinimum { qty, min_qty } => {
                self.ctx.logs.warn(format!(
                    "{} not placed: quantity {} is below the minimum order quantity {}",
                    label, qty, min_qty
                ));
                None
            }
        }
    }

    /// Submit an order; `true` only if the exchange accepted it
    async fn submit(&self, order: OrderRequest) -> bool {
        self.ctx.logs.info(format!("placing order: {}", order));
        match self.ctx.exchange.place_order(&order).await {
            Ok(ack) if ack.accepted => {
                self.ctx.logs.info(format!("order accepted: {}", ack.message));
                true
            }
            Ok(ack) => {
                self.ctx
                    .logs
                    .warn(format!("order rejected by exchange: {}", ack.message));
                false
            }
            Err(e) => {
                self.ctx.logs.error(format!("order submission failed: {}", e));
                false
            }
        }
    }

    async fn notify(&self, subject: &str, body: &str) {
        if let Err(e) = self.ctx.notifier.notify(subject, body).await {
            self.ctx
                .logs
                .error(format!("notification '{}' failed: {}", subject, e));
        }
    }
}

fn is_recognised(err: &ClientError, codes: &[i64]) -> bool {
    err.api_code().map_or(false, |code| codes.contains(&code))
}
