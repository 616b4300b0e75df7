//! # Engine Configuration
//!
//! One aggregate with a section per subsystem. Every knob has a sane
//! default; a JSON config file may override any subset.

use gs_02_criticality::ScorerConfig;
use gs_03_cascade_engine::CascadeConfig;
use gs_04_ingestion::IngestionConfig;
use gs_05_coordinator::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Criticality blend weights and depth.
    #[serde(default)]
    pub scorer: ScorerConfig,
    /// Cascade engine knobs (α, stress sensitivity, multiplier table,
    /// work budget, horizon/step bounds, top-K).
    #[serde(default)]
    pub cascade: CascadeConfig,
    /// Ingestion buffering and quality threshold.
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Worker pool and admission queue sizing.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    /// Per-subscriber bus buffer capacity.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
    /// Wall-clock bound beyond which cached criticality scores are
    /// recomputed even at an unchanged graph version.
    #[serde(default = "default_staleness", with = "humantime_serde")]
    pub criticality_staleness_bound: Duration,
}

fn default_bus_capacity() -> usize {
    shared_bus::DEFAULT_CHANNEL_CAPACITY
}

fn default_staleness() -> Duration {
    Duration::from_secs(30)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerConfig::default(),
            cascade: CascadeConfig::default(),
            ingestion: IngestionConfig::default(),
            coordinator: CoordinatorConfig::default(),
            bus_capacity: default_bus_capacity(),
            criticality_staleness_bound: default_staleness(),
        }
    }
}

impl EngineConfig {
    /// Loads a JSON config file; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// I/O or parse failures, with the offending path in the message.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing config {}: {e}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.bus_capacity, shared_bus::DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.criticality_staleness_bound, Duration::from_secs(30));
        assert_eq!(config.ingestion.buffer_capacity, 1000);
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{
            "ingestion": {"buffer_capacity": 64, "quality_threshold": 0.8},
            "criticality_staleness_bound": "2m"
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.ingestion.buffer_capacity, 64);
        assert_eq!(config.criticality_staleness_bound, Duration::from_secs(120));
        // Untouched sections keep defaults.
        assert_eq!(config.cascade.top_k_critical_paths, 5);
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bus_capacity, config.bus_capacity);
        assert_eq!(back.coordinator.queue_capacity, config.coordinator.queue_capacity);
    }
}
