//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::errors::BotError;
use crate::common::types::Side;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange connection configuration
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Grid parameters for the run
    pub bot: BotConfig,
    /// Notification delivery
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Bybit connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Base URL for the REST API
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Signature validity window in milliseconds
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            rest_url: default_rest_url(),
            recv_window_ms: default_recv_window(),
        }
    }
}

impl ExchangeConfig {
    /// Credentials, if both key and secret are present
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ApiCredentials::new(key.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

fn default_rest_url() -> String {
    "https://api.bybit.com".to_string()
}

fn default_recv_window() -> u64 {
    5000
}

/// One rung of the entry ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderStep {
    /// Quote-currency budget for this rung
    #[serde(alias = "usdt")]
    pub notional: Decimal,
    /// Percentage distance from the previous rung (ignored for the first)
    #[serde(alias = "gap", default)]
    pub gap_percent: Decimal,
}

impl LadderStep {
    pub fn new(notional: Decimal, gap_percent: Decimal) -> Self {
        Self {
            notional,
            gap_percent,
        }
    }
}

/// Grid parameters, immutable for the duration of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    /// Position direction: `Buy` (long) or `Sell` (short)
    pub side: Side,
    pub leverage: Decimal,
    /// Ladder rungs, first rung is the initial entry
    pub steps: Vec<LadderStep>,
    /// Take-profit as percent of notional per unit of leverage
    #[serde(alias = "profittake")]
    pub take_profit_percent: Decimal,
    /// Start a new cycle after each take-profit
    #[serde(default = "default_true", alias = "loop")]
    pub loop_forever: bool,
    /// Enter the first rung with a market order
    #[serde(default = "default_true", alias = "startmarketprice")]
    pub enter_at_market: bool,
}

fn default_true() -> bool {
    true
}

impl BotConfig {
    /// Reject parameters the engine cannot run with
    pub fn validate(&self) -> Result<(), BotError> {
        let invalid = |msg: String| Err(BotError::InvalidConfig(msg));

        if self.symbol.trim().is_empty() {
            return invalid("symbol must not be empty".to_string());
        }
        if self.leverage <= Decimal::ZERO {
            return invalid(format!("leverage must be positive, got {}", self.leverage));
        }
        if self.steps.is_empty() {
            return invalid("at least one ladder step is required".to_string());
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.notional <= Decimal::ZERO {
                return invalid(format!("step {} notional must be positive", i + 1));
            }
            if step.gap_percent < Decimal::ZERO {
                return invalid(format!("step {} gap must not be negative", i + 1));
            }
            if self.side == Side::Buy && step.gap_percent >= Decimal::ONE_HUNDRED {
                return invalid(format!("step {} gap must be below 100% on a long ladder", i + 1));
            }
        }
        if self.take_profit_percent <= Decimal::ZERO {
            return invalid("take-profit rate must be positive".to_string());
        }
        Ok(())
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Webhook receiving JSON alerts; log-only when absent
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Pause between healthy ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    /// Pause after a failed tick
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,
    /// Pause after a take-profit before the next cycle
    #[serde(default = "default_cycle_cooldown")]
    pub cycle_cooldown_seconds: u64,
    /// Upper bound on waiting for the worker during stop
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_seconds: u64,
    /// Pause between a market entry and re-reading the position
    #[serde(default = "default_fill_settle")]
    pub fill_settle_seconds: u64,
    /// Exchange codes meaning the account is already in hedge mode
    #[serde(default = "default_hedge_mode_ok_codes")]
    pub hedge_mode_ok_codes: Vec<i64>,
    /// Exchange codes meaning leverage is already at the requested value
    #[serde(default = "default_leverage_ok_codes")]
    pub leverage_ok_codes: Vec<i64>,
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            tick_interval_seconds: default_tick_interval(),
            error_backoff_seconds: default_error_backoff(),
            cycle_cooldown_seconds: default_cycle_cooldown(),
            stop_timeout_seconds: default_stop_timeout(),
            fill_settle_seconds: default_fill_settle(),
            hedge_mode_ok_codes: default_hedge_mode_ok_codes(),
            leverage_ok_codes: default_leverage_ok_codes(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_tick_interval() -> u64 {
    15
}

fn default_error_backoff() -> u64 {
    30
}

fn default_cycle_cooldown() -> u64 {
    60
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_fill_settle() -> u64 {
    3
}

// Bybit v5: 110025 "position mode not modified", 110021 hedge-mode conflict
fn default_hedge_mode_ok_codes() -> Vec<i64> {
    vec![110025, 110021]
}

// Bybit v5: 110043 "leverage not modified"
fn default_leverage_ok_codes() -> Vec<i64> {
    vec![110043]
}

/// API credentials for authenticated requests
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
