//! Run state, engine settings and status snapshots

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;

use crate::config::types::AppSettings;

/// Lifecycle of a run
///
/// `Stopped -> Initializing -> AwaitingEntry <-> PositionOpen -> Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Stopped,
    Initializing,
    AwaitingEntry,
    PositionOpen,
}

impl RunState {
    pub fn is_running(self) -> bool {
        !matches!(self, RunState::Stopped)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Stopped => write!(f, "stopped"),
            RunState::Initializing => write!(f, "initializing"),
            RunState::AwaitingEntry => write!(f, "awaiting entry"),
            RunState::PositionOpen => write!(f, "position open"),
        }
    }
}

/// Shared cell holding the current [`RunState`]
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<RwLock<RunState>>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Arc::new(RwLock::new(RunState::Stopped)))
    }

    pub(crate) fn get(&self) -> RunState {
        *self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set(&self, state: RunState) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }
}

/// Read-only view handed to the control surface
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub running: bool,
    pub state: RunState,
    /// Recent events, newest first
    pub logs: Vec<String>,
}

/// Timing and exchange-code settings for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Pause between healthy ticks
    pub tick_interval: Duration,
    /// Pause after a tick that failed
    pub error_backoff: Duration,
    /// Pause after a completed take-profit before the next ladder
    pub cycle_cooldown: Duration,
    /// Bound on waiting for the worker inside `stop()`
    pub stop_timeout: Duration,
    /// Pause between a market entry and re-reading the position
    pub fill_settle: Duration,
    /// Position-mode error codes meaning "already in hedge mode"
    pub hedge_mode_ok_codes: Vec<i64>,
    /// Leverage error codes meaning "leverage unchanged"
    pub leverage_ok_codes: Vec<i64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&AppSettings::default())
    }
}

impl From<&AppSettings> for EngineSettings {
    fn from(settings: &AppSettings) -> Self {
        Self {
            tick_interval: Duration::from_secs(settings.tick_interval_seconds),
            error_backoff: Duration::from_secs(settings.error_backoff_seconds),
            cycle_cooldown: Duration::from_secs(settings.cycle_cooldown_seconds),
            stop_timeout: Duration::from_secs(settings.stop_timeout_seconds),
            fill_settle: Duration::from_secs(settings.fill_settle_seconds),
            hedge_mode_ok_codes: settings.hedge_mode_ok_codes.clone(),
            leverage_ok_codes: settings.leverage_ok_codes.clone(),
        }
    }
}
