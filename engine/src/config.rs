//! Construction parameters of a simulation.

use std::time::Duration;

use corridor_defence_core::{millis, CellCoord, Damage, TowerStats, WaveConfig};
use corridor_defence_world::Layout;
use serde::{Deserialize, Serialize};

/// Everything a [`Simulation`](crate::Simulation) is built from.
///
/// Every field falls back to the reference value when omitted, so an empty
/// document describes the reference game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated time covered by one tick; also the tick cadence.
    #[serde(rename = "tick_interval_ms", with = "millis")]
    pub tick_interval: Duration,
    /// Delay between `start` and the first wave.
    #[serde(rename = "first_wave_delay_ms", with = "millis")]
    pub first_wave_delay: Duration,
    /// Grid and route endpoints.
    pub layout: Layout,
    /// The single tower placed at construction.
    pub tower: StarterTower,
    /// Wave constants.
    pub waves: WaveConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            first_wave_delay: Duration::from_millis(2_000),
            layout: Layout::reference(),
            tower: StarterTower::default(),
            waves: WaveConfig::default(),
        }
    }
}

/// Placement and stats of the starter tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterTower {
    /// Cell the tower occupies.
    pub cell: CellCoord,
    /// Reach in grid cells.
    pub range: u32,
    /// Damage dealt per hit.
    pub damage: Damage,
    /// Cooldown restored after firing.
    #[serde(rename = "base_cooldown_ms", with = "millis")]
    pub base_cooldown: Duration,
}

impl StarterTower {
    /// Combat parameters of the tower.
    #[must_use]
    pub const fn stats(&self) -> TowerStats {
        TowerStats::new(self.range, self.damage, self.base_cooldown)
    }
}

impl Default for StarterTower {
    fn default() -> Self {
        Self {
            cell: CellCoord::new(3, 4),
            range: 5,
            damage: Damage::new(50),
            base_cooldown: Duration::from_millis(1_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_reference_values() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{ "tick_interval_ms": 250, "tower": { "damage": 70 } }"#,
        )
        .expect("valid config");

        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.first_wave_delay, Duration::from_millis(2_000));
        assert_eq!(config.tower.damage, Damage::new(70));
        assert_eq!(config.tower.cell, CellCoord::new(3, 4));
        assert_eq!(config.layout, Layout::reference());
        assert_eq!(config.waves, WaveConfig::default());
    }
}
