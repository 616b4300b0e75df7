//! Telemetry configuration.

/// Logging/metrics configuration, usually read from the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on the startup log line.
    pub service_name: String,
    /// `tracing` env-filter directive, e.g. `info` or `gs_04_ingestion=debug`.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "grid-sentinel".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Reads `GS_SERVICE_NAME` and `GS_LOG_LEVEL`, falling back to the
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("GS_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: std::env::var("GS_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "grid-sentinel");
        assert_eq!(config.log_level, "info");
    }
}
