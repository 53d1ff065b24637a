//! Logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{CartConfig, LogFormat};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Configuration warnings collected before a
/// subscriber existed are emitted here. Calling this twice is harmless; the second call
/// reports false.
pub fn init(config: &CartConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    match installed {
        Ok(()) => {
            for warning in &config.warnings {
                tracing::warn!("{}", warning);
            }
            tracing::debug!(
                allowed_types = ?config.allowed_types,
                "Cart logging initialized"
            );
            true
        }
        Err(_) => false,
    }
}
