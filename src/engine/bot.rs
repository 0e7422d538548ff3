//! Control surface: start, stop and status

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::instrument;

use super::reconcile::{Reconciler, RunContext};
use super::state::{BotStatus, EngineSettings, RunState, StateCell};
use crate::common::errors::BotError;
use crate::common::log_buffer::LogBuffer;
use crate::common::shutdown::Shutdown;
use crate::common::traits::{ExchangeClient, Notifier};
use crate::config::types::BotConfig;

/// Background worker of the current run
struct Worker {
    symbol: String,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

/// Grid bot managing one instrument and one logical position
///
/// Owns its run state, log buffer and at most one background worker.
/// The exchange client is shared between the worker and `stop()`.
pub struct GridBot {
    exchange: Arc<dyn ExchangeClient>,
    notifier: Arc<dyn Notifier>,
    settings: EngineSettings,
    logs: LogBuffer,
    state: StateCell,
    worker: Mutex<Option<Worker>>,
}

impl GridBot {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        notifier: Arc<dyn Notifier>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            exchange,
            notifier,
            settings,
            logs: LogBuffer::new(),
            state: StateCell::new(),
            worker: Mutex::new(None),
        }
    }

    /// Validate `config` and spawn the worker
    ///
    /// A no-op (logged) if a run is already in progress. Must be called
    /// from within a tokio runtime.
    pub fn start(&self, config: BotConfig) -> Result<(), BotError> {
        let mut slot = self.lock_worker();

        if self.state.get().is_running() {
            self.logs.warn("bot is already running; start ignored");
            return Ok(());
        }

        if let Err(e) = config.validate() {
            self.logs.error(format!("start rejected: {}", e));
            return Err(e);
        }

        let shutdown = Shutdown::new();
        let ctx = RunContext {
            exchange: self.exchange.clone(),
            notifier: self.notifier.clone(),
            logs: self.logs.clone(),
            state: self.state.clone(),
            settings: self.settings.clone(),
        };
        let symbol = config.symbol.clone();

        self.state.set(RunState::Initializing);
        self.logs.info(format!(
            "starting {} {} grid: leverage {}x, {} steps, take-profit {}%, loop {}, market entry {}",
            config.symbol,
            config.side,
            config.leverage,
            config.steps.len(),
            config.take_profit_percent,
            config.loop_forever,
            config.enter_at_market
        ));

        let handle = tokio::spawn(run_worker(ctx, config, shutdown.clone()));
        *slot = Some(Worker {
            symbol,
            shutdown,
            handle,
        });
        Ok(())
    }

    /// Cancel the run, wait for the worker, then cancel resting orders
    ///
    /// Waits at most the configured stop timeout for the worker before
    /// aborting it. A no-op (logged) when already stopped.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let worker = {
            let mut slot = self.lock_worker();
            if !self.state.get().is_running() {
                None
            } else {
                slot.take()
            }
        };

        let Some(mut worker) = worker else {
            self.logs.warn("bot is already stopped; stop ignored");
            return;
        };

        worker.shutdown.cancel();
        match tokio::time::timeout(self.settings.stop_timeout, &mut worker.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.logs.error(format!("worker ended abnormally: {}", e)),
            Err(_) => {
                self.logs.warn(format!(
                    "worker did not stop within {}s; aborting it",
                    self.settings.stop_timeout.as_secs()
                ));
                worker.handle.abort();
            }
        }

        // Stays Running until cleanup returns; start() is ignored meanwhile
        match self.exchange.cancel_all_orders(&worker.symbol).await {
            Ok(()) => self
                .logs
                .info(format!("cancelled all open orders on {}", worker.symbol)),
            Err(e) => self.logs.error(format!("failed to cancel open orders: {}", e)),
        }
        self.state.set(RunState::Stopped);
        self.logs.info("bot stopped");
    }

    /// Current state and recent log entries; never blocks on the worker
    pub fn status(&self) -> BotStatus {
        let state = self.state.get();
        BotStatus {
            running: state.is_running(),
            state,
            logs: self.logs.snapshot(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.get().is_running()
    }

    /// Shared handle to the event log
    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_worker(ctx: RunContext, config: BotConfig, shutdown: Shutdown) {
    let logs = ctx.logs.clone();
    let state = ctx.state.clone();

    match Reconciler::initialize(ctx, config, shutdown).await {
        Ok(reconciler) => reconciler.run().await,
        Err(e) => {
            logs.error(format!("initial setup failed: {}", e));
            state.set(RunState::Stopped);
        }
    }
}
