//! Configuration module for the cart core.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;

use crate::errors::CartError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(CartError::Validation(format!("unknown log format {:?}", s))),
        }
    }
}

/// Cart configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Object `@type`s that may enter the cart
    pub allowed_types: Vec<String>,
    /// Display name of a fresh in-memory cart
    pub default_name: String,
    /// Status given to cart records created by synchronization
    pub record_status: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Problems found while loading, reported once logging is up
    pub warnings: Vec<String>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            allowed_types: vec!["Dataset".to_string()],
            default_name: "Untitled".to_string(),
            record_status: "current".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            warnings: Vec::new(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let allowed_types = env::var("CART_ALLOWED_TYPES")
            .ok()
            .map(|raw| parse_list(&raw))
            .filter(|types| !types.is_empty())
            .unwrap_or(defaults.allowed_types);

        let default_name = env::var("CART_DEFAULT_NAME").unwrap_or(defaults.default_name);

        let record_status = env::var("CART_STATUS").unwrap_or(defaults.record_status);

        let log_level = env::var("CART_LOG_LEVEL").unwrap_or(defaults.log_level);

        let mut warnings = Vec::new();
        let log_format = match env::var("CART_LOG_FORMAT") {
            Ok(raw) => raw.parse::<LogFormat>().unwrap_or_else(|e: CartError| {
                warnings.push(format!("CART_LOG_FORMAT: {}, using text", e));
                LogFormat::Text
            }),
            Err(_) => defaults.log_format,
        };

        Self {
            allowed_types,
            default_name,
            record_status,
            log_level,
            log_format,
            warnings,
        }
    }
}

/// Split a comma separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
