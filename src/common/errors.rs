//! Error types for the application

use thiserror::Error;

/// Result type alias using our ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error type for exchange and notifier client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Exchange answered with a non-zero return code
    #[error("Exchange error {code}: {message}")]
    Api { code: i64, message: String },

    /// Symbol unknown to the exchange
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Exchange return code, if this error carries one
    pub fn api_code(&self) -> Option<i64> {
        match self {
            ClientError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Engine-level error taxonomy
///
/// Order-level outcomes that are not failures (a quantity below the
/// instrument minimum, an order the exchange declined) are not represented
/// here; see [`crate::strategy::Sizing`] and [`crate::common::types::OrderAck`].
#[derive(Error, Debug)]
pub enum BotError {
    /// Initialization failed; the run ends before the tick loop starts
    #[error("setup failed while {stage}: {source}")]
    Setup {
        stage: &'static str,
        #[source]
        source: ClientError,
    },

    /// An RPC inside a tick failed; the tick ends and the loop backs off
    #[error("exchange call failed: {0}")]
    Transient(#[from] ClientError),

    /// Bot configuration rejected at start
    #[error("invalid bot configuration: {0}")]
    InvalidConfig(String),

    /// Cancellation observed at a checkpoint
    #[error("run cancelled")]
    Cancelled,
}

impl BotError {
    pub(crate) fn setup(stage: &'static str) -> impl FnOnce(ClientError) -> BotError {
        move |source| BotError::Setup { stage, source }
    }
}
