//! Reconciliation engine
//!
//! ```text
//!  start(config) ──► Initializing ──(setup ok)──► tick loop ──► Stopped
//!                        │                          │
//!                   setup failed             flat: lay ladder (AwaitingEntry)
//!                        ▼                   open: keep take-profit (PositionOpen)
//!                     Stopped
//! ```
//!
//! [`GridBot`] is the control surface; each run is driven by an internal
//! reconciler on a tokio task that observes the exchange every tick and
//! converges it toward the target orders.

pub mod bot;
mod reconcile;
pub mod state;

pub use bot::GridBot;
pub use state::{BotStatus, EngineSettings, RunState};
