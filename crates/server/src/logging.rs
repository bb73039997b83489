use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};

/// `RUST_LOG` wins over `logging.level` when set.
pub fn init_tracing(config: &ServerConfig) -> Result<(), ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(());
    }

    let level = config.logging.level.as_deref().unwrap_or("info").trim();
    let filter = EnvFilter::try_new(level)
        .map_err(|e| ConfigError::Invalid(format!("invalid logging.level: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}
