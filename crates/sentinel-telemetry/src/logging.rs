//! Structured logging setup over `tracing-subscriber`.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global fmt subscriber with an env-filter.
///
/// A second call (tests, embedded use) is a no-op rather than an error.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_rejected() {
        let config = TelemetryConfig {
            log_level: "not[a(filter".into(),
            ..TelemetryConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
