//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init(log_level: &str) -> Result<(), ConfigError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level).map_err(|e| ConfigError::InvalidValue {
            key: "LOAN_ASSIST_LOG_LEVEL".to_string(),
            message: e.to_string(),
        })?,
    };

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
    {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        assert!(init("debug").is_ok());
        assert!(init("info").is_ok());
    }
}
