//! # Event Multiplier
//!
//! Events do not hit every sector equally: a hurricane batters outdoor power
//! and transport assets, a cyberattack leans on telecom, a flood on water
//! infrastructure. The multiplier table encodes per-(event, sector) weights;
//! the resulting hazard multiplier is
//!
//! `clamp(1 + severity · weight + environment_bonus, 0.5, 3.0)`
//!
//! applied to the edge hazard for the *failed upstream* node's sector.

use serde::{Deserialize, Serialize};
use shared_types::{EnvironmentConditions, EventKind, NodeKind};
use std::collections::BTreeMap;

/// Multiplier lower bound.
pub const MULTIPLIER_FLOOR: f64 = 0.5;
/// Multiplier upper bound.
pub const MULTIPLIER_CEIL: f64 = 3.0;

/// Per-(event kind, sector) amplification weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierTable {
    weights: BTreeMap<EventKind, BTreeMap<NodeKind, f64>>,
    /// Weight used when the table has no entry for an (event, sector) pair.
    fallback_weight: f64,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(
            EventKind::Hurricane,
            sector_weights(&[
                (NodeKind::Power, 0.9),
                (NodeKind::Transport, 0.8),
                (NodeKind::Telecom, 0.6),
                (NodeKind::Water, 0.5),
            ]),
        );
        weights.insert(
            EventKind::Earthquake,
            sector_weights(&[
                (NodeKind::Water, 0.9),
                (NodeKind::Transport, 0.9),
                (NodeKind::Power, 0.7),
                (NodeKind::Healthcare, 0.5),
            ]),
        );
        weights.insert(
            EventKind::Flood,
            sector_weights(&[
                (NodeKind::Water, 1.0),
                (NodeKind::Transport, 0.8),
                (NodeKind::Power, 0.6),
            ]),
        );
        weights.insert(
            EventKind::Cyberattack,
            sector_weights(&[
                (NodeKind::Telecom, 1.2),
                (NodeKind::Power, 0.7),
                (NodeKind::Healthcare, 0.5),
                (NodeKind::Emergency, 0.4),
            ]),
        );
        weights.insert(
            EventKind::PowerOutage,
            sector_weights(&[
                (NodeKind::Power, 1.0),
                (NodeKind::Healthcare, 0.6),
                (NodeKind::Telecom, 0.5),
                (NodeKind::Water, 0.4),
            ]),
        );
        Self {
            weights,
            fallback_weight: 0.3,
        }
    }
}

fn sector_weights(pairs: &[(NodeKind, f64)]) -> BTreeMap<NodeKind, f64> {
    pairs.iter().copied().collect()
}

impl MultiplierTable {
    /// Hazard multiplier for a failed upstream node of sector `upstream`
    /// under the given event, bounded to [0.5, 3.0].
    #[must_use]
    pub fn multiplier(
        &self,
        kind: EventKind,
        severity: f64,
        environment: Option<&EnvironmentConditions>,
        upstream: NodeKind,
    ) -> f64 {
        let weight = self
            .weights
            .get(&kind)
            .and_then(|sectors| sectors.get(&upstream))
            .copied()
            .unwrap_or(self.fallback_weight);

        let bonus = environment.map_or(0.0, environment_bonus);

        (1.0 + severity.clamp(0.0, 1.0) * weight + bonus).clamp(MULTIPLIER_FLOOR, MULTIPLIER_CEIL)
    }
}

/// Additive bonus for hostile environmental conditions.
fn environment_bonus(env: &EnvironmentConditions) -> f64 {
    let mut bonus = 0.0;
    if env.temperature_celsius.is_some_and(|t| t > 35.0) {
        bonus += 0.2;
    }
    if env.wind_speed_kmh.is_some_and(|w| w > 50.0) {
        bonus += 0.3;
    }
    if env.precipitation_mm.is_some_and(|p| p > 100.0) {
        bonus += 0.25;
    }
    bonus
}
