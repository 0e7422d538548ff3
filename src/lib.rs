//! GridBot Library
//!
//! A reconciliation engine for Bybit linear perpetuals: it lays a
//! cumulative entry ladder while flat and keeps a single take-profit order
//! in line with the position once filled.

pub mod bybit;
pub mod common;
pub mod config;
pub mod engine;
pub mod notify;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{BotError, ClientError, Result};
pub use common::log_buffer::LogBuffer;
pub use common::shutdown::Shutdown;
pub use common::traits::{ExchangeClient, Notifier};
pub use common::types::{
    InstrumentInfo, OpenOrder, OrderAck, OrderRequest, OrderType, PositionMode, PositionSnapshot,
    Side,
};
pub use config::types::{AppConfig, BotConfig, LadderStep};
pub use bybit::BybitRestClient;
pub use engine::{BotStatus, EngineSettings, GridBot, RunState};
pub use notify::{LogNotifier, WebhookNotifier};
