//! # Grid Sentinel
//!
//! Entry point for the resilience engine. Boots telemetry, assembles the
//! platform, optionally warm-starts the graph from a snapshot file, and
//! runs until interrupted.
//!
//! ## Environment
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `GS_CONFIG` | Path to a JSON config file (all fields optional) |
//! | `GS_SNAPSHOT` | Path to a JSON-lines graph snapshot to load on boot |
//! | `GS_LOG_LEVEL` | Log filter, default `info` |

use anyhow::Result;
use engine_runtime::{persistence, EngineConfig, ResiliencePlatform};
use sentinel_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_telemetry(TelemetryConfig::from_env())?;

    let config = match std::env::var("GS_CONFIG") {
        Ok(path) => EngineConfig::from_file(path)?,
        Err(_) => EngineConfig::default(),
    };

    let platform = ResiliencePlatform::new(config);

    if let Ok(path) = std::env::var("GS_SNAPSHOT") {
        let (nodes, edges) = persistence::load_graph(platform.store(), &path)?;
        let scored = platform.refresh_criticality();
        info!(nodes, edges, scored, "Warm start complete");
    }

    info!("Grid Sentinel running; Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    platform.shutdown();
    Ok(())
}
