//! Configuration loader

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{ClientError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with GRIDBOT__)
/// 2. Configuration file (TOML format)
/// 3. Default values
///
/// `BYBIT_API_KEY` / `BYBIT_API_SECRET` fill credentials left unset by
/// the layers above.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("GRIDBOT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    apply_env_credentials(&mut app);
    Ok(app)
}

/// Parse configuration from an in-memory TOML document
pub fn parse_config(toml: &str) -> Result<AppConfig> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| ClientError::Configuration(e.to_string()))
}

fn apply_env_credentials(app: &mut AppConfig) {
    if app.exchange.api_key.is_none() {
        app.exchange.api_key = std::env::var("BYBIT_API_KEY").ok();
    }
    if app.exchange.api_secret.is_none() {
        app.exchange.api_secret = std::env::var("BYBIT_API_SECRET").ok();
    }
}
